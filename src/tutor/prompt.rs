use crate::{
    Error, Result,
    llm::{ImageData, Part},
    session::{Question, Session, SessionEvent},
};
use std::{fmt, str::FromStr};

/// Tutoring persona sent as the system instruction.
pub const SYSTEM_PROMPT: &str = include_str!("../../prompts/science_helper.md");

pub const REGENERATE_INSTRUCTION: &str = "Based on the previous question and image (if any), please explain again or provide an alternative solution.";
pub const SIMPLIFY_INSTRUCTION: &str = "Please make the previous explanation simpler.";

const QUESTION_SNIPPET_CHARS: usize = 70;
const ANSWER_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Ask,
    Regenerate,
    Simplify,
}

/// Input for one turn of a session.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub action: Action,
    pub text: Option<String>,
    pub image: Option<ImageData>,
}

/// What gets sent for a turn, and the question to remember when it is a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub parts: Vec<Part>,
    pub question: Option<Question>,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ask => "ask",
            Action::Regenerate => "regenerate",
            Action::Simplify => "simplify",
        }
    }

    pub fn event(&self) -> SessionEvent {
        match self {
            Action::Ask => SessionEvent::Asked,
            Action::Regenerate => SessionEvent::Regenerated,
            Action::Simplify => SessionEvent::Simplified,
        }
    }

    /// The error returned when a follow-up has nothing to follow.
    pub fn missing_context(&self, session_id: impl Into<String>) -> Option<Error> {
        let session_id = session_id.into();
        match self {
            Action::Ask => None,
            Action::Regenerate => Some(Error::NoPreviousQuestion { session_id }),
            Action::Simplify => Some(Error::NoPreviousAnswer { session_id }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "ask" => Ok(Action::Ask),
            "regenerate" => Ok(Action::Regenerate),
            "simplify" => Ok(Action::Simplify),
            other => Err(Error::invalid_request(format!(
                "Unsupported action: {}. Use ask, regenerate or simplify.",
                other
            ))),
        }
    }
}

impl TurnRequest {
    pub fn ask(text: impl Into<String>) -> Self {
        Self {
            action: Action::Ask,
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn follow_up(action: Action) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }
}

/// Builds the parts for `request` from the session's stored context.
///
/// Returns an empty prompt for an `ask` without text or image.
pub fn assemble(request: &TurnRequest, session: &Session) -> Result<Prompt> {
    match request.action {
        Action::Ask => {
            let text = request.text.clone().filter(|t| !t.trim().is_empty());
            let image = request.image.clone();

            let mut parts = Vec::new();
            if let Some(text) = &text {
                parts.push(Part::Text(text.clone()));
            }
            if let Some(image) = &image {
                parts.push(Part::Image(image.clone()));
            }

            let question = Question::new(text, image);
            Ok(Prompt {
                parts,
                question: Some(question),
            })
        }
        Action::Regenerate => {
            let previous = session
                .previous_question()
                .ok_or_else(|| Error::NoPreviousQuestion {
                    session_id: session.id.clone(),
                })?;

            let mut instruction = REGENERATE_INSTRUCTION.to_string();
            if let Some(text) = previous.text.as_deref().filter(|t| !t.is_empty()) {
                instruction.push_str(&format!(
                    " The previous question was about: '{}...'.",
                    snippet(text, QUESTION_SNIPPET_CHARS)
                ));
            }

            let mut parts = vec![Part::Text(instruction)];
            if let Some(image) = &previous.image {
                parts.push(Part::Image(image.clone()));
            }

            Ok(Prompt {
                parts,
                question: None,
            })
        }
        Action::Simplify => {
            let previous = session
                .previous_answer()
                .ok_or_else(|| Error::NoPreviousAnswer {
                    session_id: session.id.clone(),
                })?;

            let instruction = format!(
                "{} The previous answer started with: \"{}...\"",
                SIMPLIFY_INSTRUCTION,
                snippet(previous, ANSWER_SNIPPET_CHARS)
            );

            Ok(Prompt {
                parts: vec![Part::Text(instruction)],
                question: None,
            })
        }
    }
}

/// First `max_chars` characters of `text`.
pub fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
