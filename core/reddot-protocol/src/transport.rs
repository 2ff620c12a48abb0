//! Transport layer abstraction.
//!
//! A transport moves a complete `IODATA` request to the server and returns
//! the raw reply text. It knows nothing about sessions or error markers;
//! that is the channel's job.

use crate::error::ProtocolResult;
use async_trait::async_trait;

/// Carries rendered RQL requests to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the reply text.
    ///
    /// Connection failures and timeouts surface as
    /// [`crate::ProtocolError::Transport`].
    async fn send(&self, request: &str) -> ProtocolResult<String>;

    /// Short name for log output.
    fn name(&self) -> &str;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::ProtocolError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum MockReply {
        Text(String),
        Failure(String),
    }

    /// Replays queued replies and records every request.
    ///
    /// When the queue is empty the default reply is used, if set.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        replies: Mutex<VecDeque<MockReply>>,
        default_reply: Mutex<Option<String>>,
        requests: Mutex<Vec<String>>,
        sent: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockTransport {
        /// A mock with no replies queued.
        pub fn new() -> Self {
            Self::default()
        }

        /// Answers every request with `reply`.
        pub fn always(reply: impl Into<String>) -> Self {
            let mock = Self::new();
            mock.set_default_reply(reply);
            mock
        }

        /// Sleeps before every reply, so concurrent callers overlap.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Queues a reply text.
        pub fn push_reply(&self, reply: impl Into<String>) {
            self.replies
                .lock()
                .unwrap()
                .push_back(MockReply::Text(reply.into()));
        }

        /// Queues a transport failure.
        pub fn push_failure(&self, message: impl Into<String>) {
            self.replies
                .lock()
                .unwrap()
                .push_back(MockReply::Failure(message.into()));
        }

        /// Reply used whenever the queue is empty.
        pub fn set_default_reply(&self, reply: impl Into<String>) {
            *self.default_reply.lock().unwrap() = Some(reply.into());
        }

        /// Number of requests sent so far.
        pub fn request_count(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }

        /// Every request sent so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        /// The most recent request, if any.
        pub fn last_request(&self) -> Option<String> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &str) -> ProtocolResult<String> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.to_string());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let queued = self.replies.lock().unwrap().pop_front();
            match queued {
                Some(MockReply::Text(text)) => Ok(text),
                Some(MockReply::Failure(message)) => Err(ProtocolError::Transport(message)),
                None => self
                    .default_reply
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| ProtocolError::Transport("no reply queued".into())),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}
