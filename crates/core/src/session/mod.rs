//! Life-counter session: state machine, debounced history, persistence

mod persist;
mod state;
mod store;

pub use persist::{PersistWorker, Roster};
pub use state::{PendingDelta, SessionEvent, SessionSnapshot, SessionState};
pub use store::SessionStore;
