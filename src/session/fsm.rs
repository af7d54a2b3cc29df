use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    New,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Asked,
    Regenerated,
    Simplified,
}

impl SessionState {
    /// Sessions never close, so every valid transition ends in `Active`.
    pub fn transition(self, event: SessionEvent) -> Result<SessionState> {
        let new_state = match (self, event) {
            (SessionState::New, SessionEvent::Asked) => SessionState::Active,
            (SessionState::Active, _) => SessionState::Active,
            (SessionState::New, _) => {
                warn!(
                    "Invalid session transition from {:?} with event {:?}",
                    self, event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", self),
                    requested: format!("{:?}", event),
                });
            }
        };

        if self != new_state {
            info!(
                "Session state transition: {:?} -> {:?} (event: {:?})",
                self, new_state, event
            );
        } else {
            debug!("Session staying in state {:?} after event {:?}", self, event);
        }

        Ok(new_state)
    }
}
