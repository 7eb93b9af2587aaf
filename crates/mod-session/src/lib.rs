pub mod guard;
pub mod store;

pub use guard::{UserGuard, UserLocks};
pub use store::{PersistedState, SessionStore, STATE_FILE_NAME};
