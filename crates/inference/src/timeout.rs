use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::{InferenceError, TextInference};

/// Bounds every call of the wrapped client. Dropping the returned future
/// (e.g. when the inbound connection closes) cancels the inner call too.
pub struct WithTimeout {
    inner: Arc<dyn TextInference>,
    limit: Duration,
}

impl WithTimeout {
    pub fn new(inner: Arc<dyn TextInference>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl TextInference for WithTimeout {
    async fn infer(&self, input: &str) -> Result<String, InferenceError> {
        match tokio::time::timeout(self.limit, self.inner.infer(input)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout(self.limit)),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiteralInference;

    struct Sleepy;

    #[async_trait]
    impl TextInference for Sleepy {
        async fn infer(&self, _input: &str) -> Result<String, InferenceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }

        fn name(&self) -> &str {
            "sleepy"
        }
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let bounded = WithTimeout::new(Arc::new(Sleepy), Duration::from_millis(20));
        let err = bounded.infer("anything").await.unwrap_err();
        assert!(matches!(err, InferenceError::Timeout(d) if d == Duration::from_millis(20)));
        assert_eq!(bounded.name(), "sleepy");
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let bounded = WithTimeout::new(Arc::new(LiteralInference), Duration::from_secs(1));
        assert_eq!(bounded.infer("a.b").await.unwrap(), r"a\.b");
    }
}
