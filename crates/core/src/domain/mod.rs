pub mod persona;
pub mod quote;
pub mod workflow;
