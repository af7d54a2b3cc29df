pub mod fsm;
mod store;
mod types;

pub use fsm::{SessionEvent, SessionState};
pub use store::SessionStore;
pub use types::{Question, Session};
