pub mod command;
pub mod format;
pub mod service;

pub use command::Command;
pub use service::{MailService, Replies};
