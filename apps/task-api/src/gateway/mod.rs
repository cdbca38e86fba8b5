//! Real-time notification gateway.

pub mod audience;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod presence;
pub mod registry;
pub mod reminders;
pub mod rooms;
pub mod server;
pub mod session;
