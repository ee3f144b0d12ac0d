//! Scripted mock implementation of CompletionBackend for testing.
//!
//! Replays a queue of canned responses and records every conversation it
//! receives. Conditionally compiled with `#[cfg(test)]`.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::gateway::ProviderConfig;
use super::traits::{ChatMessage, CompletionBackend, GatewayError};

enum Script {
    /// Pop one response per call; the last one repeats once the queue drains
    Queue(VecDeque<String>),
    /// Every call fails with this status/body
    Fail { status: u16, body: String },
}

pub struct MockCompletionBackend {
    name: String,
    script: Mutex<Script>,
    last: Mutex<Option<String>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockCompletionBackend {
    /// Mock registered as `"mock"`.
    pub fn new(responses: Vec<&str>) -> Self {
        Self::named("mock", responses)
    }

    pub fn named(name: &str, responses: Vec<&str>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(Script::Queue(
                responses.into_iter().map(String::from).collect(),
            )),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mock that always answers with the same text.
    pub fn always(text: &str) -> Self {
        Self::new(vec![text])
    }

    /// Mock whose every call fails with a provider error.
    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(Script::Fail {
                status,
                body: body.to_string(),
            }),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Conversation sent on the n-th call (0-based).
    pub async fn conversation(&self, n: usize) -> Vec<ChatMessage> {
        self.calls.lock().await[n].clone()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn complete(
        &self,
        _config: &ProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        self.calls.lock().await.push(messages.to_vec());

        let mut script = self.script.lock().await;
        match &mut *script {
            Script::Fail { status, body } => Err(GatewayError::Provider {
                status: *status,
                body: body.clone(),
            }),
            Script::Queue(queue) => {
                let mut last = self.last.lock().await;
                if let Some(next) = queue.pop_front() {
                    *last = Some(next);
                }
                Ok(last.clone().unwrap_or_default())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_repeat_last() {
        let mock = MockCompletionBackend::new(vec!["a", "b"]);
        let config = ProviderConfig::default();
        let msgs = [ChatMessage::user("x")];
        assert_eq!(mock.complete(&config, &msgs).await.unwrap(), "a");
        assert_eq!(mock.complete(&config, &msgs).await.unwrap(), "b");
        assert_eq!(mock.complete(&config, &msgs).await.unwrap(), "b");
        assert_eq!(mock.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockCompletionBackend::failing(503, "down");
        let err = mock
            .complete(&ProviderConfig::default(), &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Provider { status: 503, .. }));
    }
}
