pub mod diff;
pub mod frame;
pub mod renderer;
pub mod terminal;
