//! Model (text generation) port.

pub mod client;
pub mod types;
