pub mod value;
pub mod environment;
pub mod interpreter;
