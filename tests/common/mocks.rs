use async_trait::async_trait;
use science_helper::{
    Error, Result,
    llm::{Content, LlmClient, ModelReply},
};
use std::sync::{Arc, Mutex};

/// Mock LLM client for testing
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    pub replies: Arc<Mutex<Vec<ModelReply>>>,
    pub requests: Arc<Mutex<Vec<Vec<Content>>>>,
    pub fallback: Option<ModelReply>,
    pub error: Option<String>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: None,
            error: None,
        }
    }

    /// Answers every call with the same text.
    pub fn answering(answer: &str) -> Self {
        let mut client = Self::new();
        client.fallback = Some(ModelReply::Answer(answer.to_string()));
        client
    }

    pub fn with_replies(self, replies: Vec<ModelReply>) -> Self {
        *self.replies.lock().unwrap() = replies;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn get_requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }

    /// The newest user turn of the last request.
    pub fn last_user_turn(&self) -> Content {
        self.get_requests()
            .last()
            .and_then(|contents| contents.last().cloned())
            .expect("no request was sent")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, contents: Vec<Content>) -> Result<ModelReply> {
        self.requests.lock().unwrap().push(contents);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        let mut replies = self.replies.lock().unwrap();
        if !replies.is_empty() {
            return Ok(replies.remove(0));
        }

        self.fallback
            .clone()
            .ok_or_else(|| Error::llm("No more mock replies available"))
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}
