pub mod adapter;
mod extract;

pub use adapter::{ApiOkAdapter, ApiOkConfig, DEFAULT_BASE_URL, DEFAULT_MAILBOX_TYPE};
