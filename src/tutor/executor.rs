use super::prompt::{self, Action, SYSTEM_PROMPT, TurnRequest, snippet};
use crate::{
    Error, Result,
    config::LlmConfig,
    llm::{Content, LlmClient, ModelReply, create_llm_client},
    session::SessionStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const EMPTY_PROMPT_REPLY: &str =
    "I'm sorry, I didn't receive a question or enough context to respond.";

/// Runs turns against the model and keeps each session's context current.
pub struct Tutor {
    llm_client: Arc<dyn LlmClient>,
    sessions: SessionStore,
}

impl Tutor {
    pub fn new(llm_config: &LlmConfig) -> Result<Self> {
        let system_prompt = llm_config
            .system_prompt
            .clone()
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());
        let llm_client = create_llm_client(llm_config, system_prompt)?;

        info!(
            "Initialized tutor with {} model {}",
            llm_config.provider, llm_config.model
        );

        Ok(Self::with_client(llm_client))
    }

    pub fn with_client(llm_client: Arc<dyn LlmClient>) -> Self {
        Self {
            llm_client,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Answers one turn of `session_id`.
    ///
    /// Safety blocks and provider failures come back as the answer text.
    /// Follow-ups on a session that does not exist, or that has nothing to
    /// follow, are errors.
    pub async fn respond(&self, session_id: &str, request: TurnRequest) -> Result<String> {
        let session = match request.action {
            Action::Ask => self.sessions.get_or_create(session_id)?,
            action => match self.sessions.get(session_id)? {
                Some(session) => session,
                None => {
                    warn!(
                        "Session {} not found for {} request",
                        session_id, action
                    );
                    return Err(action
                        .missing_context(session_id)
                        .unwrap_or_else(|| Error::session_not_found(session_id)));
                }
            },
        };

        let prompt = prompt::assemble(&request, &session)?;

        if let Some(question) = prompt.question {
            self.sessions.record_question(session_id, question)?;
        }

        if prompt.parts.is_empty() {
            warn!(
                "No content to send for session {} with action {}",
                session_id, request.action
            );
            return Ok(EMPTY_PROMPT_REPLY.to_string());
        }

        self.sessions.advance(session_id, request.action.event())?;

        let user_turn = Content::user(prompt.parts);
        let text = user_turn.text();
        info!(
            "Sending to session {} (action: {}): Text='{}' Image parts present: {}",
            session_id,
            request.action,
            if text.is_empty() { "N/A" } else { snippet(&text, 70) },
            user_turn.has_image()
        );

        let mut contents = session.history;
        contents.push(user_turn.clone());

        match self.llm_client.generate(contents).await {
            Ok(ModelReply::Answer(answer)) => {
                self.sessions
                    .record_exchange(session_id, user_turn, answer.clone())?;
                Ok(answer)
            }
            Ok(ModelReply::Blocked { reason }) => {
                warn!(
                    "Response potentially blocked for session {}. Reason: {}",
                    session_id, reason
                );
                Ok(format!(
                    "My apologies, but I cannot respond due to safety guidelines ({}). Could you please rephrase or ask something else?",
                    reason
                ))
            }
            Err(e) => {
                error!("Error during model call for session {}: {}", session_id, e);
                Ok(format!(
                    "Sorry, I encountered an error trying to process your request: {}",
                    e
                ))
            }
        }
    }
}
