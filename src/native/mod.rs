/// Native module contains implementations of core traits
/// that drive the host's own compilers and interpreters,
/// supervising child processes directly instead of through a container.
pub mod archive;
pub mod path;
pub mod probe;
pub mod sandbox;
pub mod toolchain;
