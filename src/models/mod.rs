pub mod message;
pub mod record;
pub mod task;
pub mod window;
