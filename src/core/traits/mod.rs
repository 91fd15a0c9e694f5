pub mod archive;
pub mod sandbox;
pub mod toolchain;
