pub mod daily;
pub mod window;
