pub mod collector;
pub mod lines;
pub mod process;
