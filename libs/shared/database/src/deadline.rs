use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::error;

use crate::error::StoreError;

/// Caller-supplied bound on a storage operation.
///
/// Expiry drops the in-flight future; backends only commit in a single
/// non-suspending step, so a dropped operation leaves no partial write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub async fn run<T, F>(self, operation: &'static str, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout_at(self.0, op).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation, "storage deadline exceeded");
                Err(StoreError::Timeout { operation })
            }
        }
    }
}
