//! Messenger abstractions (Telegram today).

pub mod port;
pub mod reply;
pub mod types;
