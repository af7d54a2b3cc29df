mod executor;
pub mod prompt;

pub use executor::{EMPTY_PROMPT_REPLY, Tutor};
pub use prompt::{Action, Prompt, SYSTEM_PROMPT, TurnRequest};
