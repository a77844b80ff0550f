pub mod a2c;
pub mod env;
