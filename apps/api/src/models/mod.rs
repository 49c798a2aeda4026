pub mod cv;
pub mod interview;
