use super::{Question, Session, SessionEvent};
use crate::{Error, Result, llm::Content};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};

/// In-process session map shared by all requests.
///
/// Callers get snapshots; the lock is never held across a model call, so two
/// turns on the same session may interleave their writes. Entries live until
/// the process exits.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| Error::internal(format!("Mutex lock failed: {e}")))
    }

    /// Starts a fresh session, replacing any existing one with the same id.
    pub fn create(&self, session_id: &str) -> Result<Session> {
        let session = Session::new(session_id.to_string());
        self.lock()?
            .insert(session_id.to_string(), session.clone());
        info!("Started new session: {}", session_id);
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.lock()?.get(session_id).cloned())
    }

    pub fn get_or_create(&self, session_id: &str) -> Result<Session> {
        let mut sessions = self.lock()?;
        if let Some(session) = sessions.get(session_id) {
            return Ok(session.clone());
        }

        let session = Session::new(session_id.to_string());
        sessions.insert(session_id.to_string(), session.clone());
        info!("Started new session: {}", session_id);
        Ok(session)
    }

    pub fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(session_id))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Applies `f` to an existing session under the lock.
    pub fn update<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::session_not_found(session_id))?;
        let result = f(&mut *session)?;
        session.touch();
        Ok(result)
    }

    pub fn advance(&self, session_id: &str, event: SessionEvent) -> Result<()> {
        self.update(session_id, |session| {
            session.state = session.state.transition(event)?;
            Ok(())
        })
    }

    pub fn record_question(&self, session_id: &str, question: Question) -> Result<()> {
        self.update(session_id, |session| {
            session.last_question = Some(question);
            Ok(())
        })
    }

    pub fn record_answer(&self, session_id: &str, answer: impl Into<String>) -> Result<()> {
        let answer = answer.into();
        self.update(session_id, |session| {
            session.last_answer = Some(answer);
            Ok(())
        })
    }

    /// Appends a completed user/model exchange and remembers the answer.
    pub fn record_exchange(
        &self,
        session_id: &str,
        user: Content,
        answer: impl Into<String>,
    ) -> Result<()> {
        let answer = answer.into();
        self.update(session_id, |session| {
            session.history.push(user);
            session.history.push(Content::model(answer.clone()));
            session.last_answer = Some(answer);
            session.turns += 1;
            debug!(
                "Session {} history length: {}",
                session.id,
                session.history.len()
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        llm::{ImageData, Part, Role},
        session::SessionState,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_starts_empty() {
        let store = SessionStore::new();
        let session = store.create("abc").unwrap();

        assert_eq!(session.id, "abc");
        assert_eq!(session.state, SessionState::New);
        assert!(session.last_question.is_none());
        assert!(session.last_answer.is_none());
        assert!(session.history.is_empty());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_create_resets_existing_session() {
        let store = SessionStore::new();
        store.create("abc").unwrap();
        store.record_answer("abc", "old answer").unwrap();

        let session = store.create("abc").unwrap();
        assert!(session.last_answer.is_none());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_or_create_keeps_existing_state() {
        let store = SessionStore::new();
        store.get_or_create("abc").unwrap();
        store.record_answer("abc", "Photosynthesis makes sugar.").unwrap();

        let session = store.get_or_create("abc").unwrap();
        assert_eq!(session.previous_answer(), Some("Photosynthesis makes sugar."));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_record_question_overwrites() {
        let store = SessionStore::new();
        store.create("abc").unwrap();

        store
            .record_question("abc", Question::new(Some("first".to_string()), None))
            .unwrap();
        store
            .record_question(
                "abc",
                Question::new(None, Some(ImageData::new("image/png", vec![7]))),
            )
            .unwrap();

        let session = store.get("abc").unwrap().unwrap();
        let question = session.previous_question().unwrap();
        assert!(question.text.is_none());
        assert_eq!(question.image.as_ref().unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_record_exchange_appends_history() {
        let store = SessionStore::new();
        store.create("abc").unwrap();

        let user = Content::user(vec![Part::Text("What is an atom?".to_string())]);
        store.record_exchange("abc", user, "The smallest unit of matter.").unwrap();

        let session = store.get("abc").unwrap().unwrap();
        assert_eq!(session.turns, 1);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[1].role, Role::Model);
        assert_eq!(session.history[1].text(), "The smallest unit of matter.");
        assert_eq!(session.previous_answer(), Some("The smallest unit of matter."));
    }

    #[test]
    fn test_updates_on_unknown_session_fail() {
        let store = SessionStore::new();

        let err = store.record_answer("missing", "text").unwrap_err();
        assert!(matches!(err, Error::SessionNotFound { .. }));
        assert!(!store.contains("missing").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_advance_applies_lifecycle() {
        let store = SessionStore::new();
        store.create("abc").unwrap();

        assert!(store.advance("abc", SessionEvent::Regenerated).is_err());
        store.advance("abc", SessionEvent::Asked).unwrap();
        store.advance("abc", SessionEvent::Simplified).unwrap();

        let session = store.get("abc").unwrap().unwrap();
        assert_eq!(session.state, SessionState::Active);
    }

    #[test]
    fn test_empty_question_is_not_a_previous_question() {
        let store = SessionStore::new();
        store.create("abc").unwrap();
        store
            .record_question("abc", Question::new(Some(String::new()), None))
            .unwrap();

        let session = store.get("abc").unwrap().unwrap();
        assert!(session.previous_question().is_none());
    }
}
