use crate::feed::{FetchError, ReservationSource};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockFetchBehavior {
    Payload(Value),
    Status(u16),
    NotJson,
    InvalidConfiguration,
    Delayed { delay: Duration, payload: Value },
    /// Never resolves; only a timeout or cancellation ends the call.
    Hang,
}

impl MockFetchBehavior {
    pub fn payload(payload: Value) -> Self {
        Self::Payload(payload)
    }

    pub fn delayed(delay: Duration, payload: Value) -> Self {
        Self::Delayed { delay, payload }
    }
}

/// Scripted source: the n-th fetch plays the n-th behaviour, the last one
/// repeats once the script runs out.
#[derive(Debug)]
pub struct MockSource {
    behaviors: Vec<MockFetchBehavior>,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(behaviors: Vec<MockFetchBehavior>) -> Self {
        Self {
            behaviors,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_behavior(&self) -> MockFetchBehavior {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.behaviors
            .get(index)
            .or_else(|| self.behaviors.last())
            .cloned()
            .unwrap_or_else(|| MockFetchBehavior::Payload(Value::Array(Vec::new())))
    }
}

impl ReservationSource for MockSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        match self.next_behavior() {
            MockFetchBehavior::Payload(payload) => Ok(payload),
            MockFetchBehavior::Status(code) => Err(FetchError::Status(code)),
            MockFetchBehavior::NotJson => Ok(serde_json::from_str("<html>oops</html>")?),
            MockFetchBehavior::InvalidConfiguration => Err(FetchError::InvalidConfiguration(
                "mock source rejected".to_string(),
            )),
            MockFetchBehavior::Delayed { delay, payload } => {
                tokio::time::sleep(delay).await;
                Ok(payload)
            }
            MockFetchBehavior::Hang => std::future::pending().await,
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
