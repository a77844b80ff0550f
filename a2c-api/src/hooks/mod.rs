pub mod logger;
pub mod recorder;
