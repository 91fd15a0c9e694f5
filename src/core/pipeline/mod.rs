pub mod judging;
pub mod running;
