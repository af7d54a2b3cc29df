use super::fsm::SessionState;
use crate::llm::{Content, ImageData};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Question {
    pub text: Option<String>,
    pub image: Option<ImageData>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub last_question: Option<Question>,
    pub last_answer: Option<String>,
    /// Every turn exchanged with the model so far.
    pub history: Vec<Content>,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    pub fn new(text: Option<String>, image: Option<ImageData>) -> Self {
        Self { text, image }
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty) && self.image.is_none()
    }
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: SessionState::New,
            last_question: None,
            last_answer: None,
            history: Vec::new(),
            turns: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A stored question that can be asked again.
    pub fn previous_question(&self) -> Option<&Question> {
        self.last_question.as_ref().filter(|q| !q.is_empty())
    }

    pub fn previous_answer(&self) -> Option<&str> {
        self.last_answer.as_deref().filter(|a| !a.is_empty())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
