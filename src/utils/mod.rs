pub mod devlog;
pub mod json;
pub mod num;
