//! Retry-across-candidates executor for providers with several model ids
//!
//! Some backends silently reject specific model identifiers while the
//! credential itself is fine. The cascade distinguishes "wrong model name"
//! (worth retrying with the next candidate) from everything else (not worth
//! retrying): only [`QueryError::ModelUnavailable`] continues the walk.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::QueryError;

/// Attempt each model candidate in order until one returns content.
///
/// `ModelUnavailable` moves on to the next candidate. Any other error —
/// account-level or otherwise — terminates the cascade immediately, since a
/// different model id cannot fix a rejected credential, an exhausted quota,
/// or a dead upstream. If every candidate is rejected, the last observed
/// detail is carried in the returned error.
pub async fn run_cascade<'a, F, Fut>(
    candidates: &'a [String],
    mut attempt: F,
) -> Result<String, QueryError>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<String, QueryError>>,
{
    let mut last_detail: Option<String> = None;

    for model in candidates {
        match attempt(model).await {
            Ok(content) => {
                debug!(model = %model, "model candidate accepted");
                return Ok(content);
            }
            Err(QueryError::ModelUnavailable(detail)) => {
                debug!(model = %model, detail = %detail, "model rejected, trying next candidate");
                last_detail = Some(detail);
            }
            Err(err) => {
                warn!(model = %model, error = %err, "cascade stopped");
                return Err(err);
            }
        }
    }

    match last_detail {
        Some(detail) => Err(QueryError::Unknown(format!(
            "all {} model candidates rejected; last error: {}",
            candidates.len(),
            detail
        ))),
        None => Err(QueryError::Unknown(
            "no model candidates configured".to_string(),
        )),
    }
}
