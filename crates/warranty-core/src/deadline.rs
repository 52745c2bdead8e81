//! Per-call deadlines for collaborator requests

use crate::error::{ResolveError, SourceError, Stage};
use std::future::Future;
use std::time::Duration;

/// Await a collaborator call, tagging failures with `stage`
///
/// With `timeout` set, a call that does not finish in time becomes
/// [`ResolveError::Timeout`].
pub(crate) async fn guarded<T, F>(
    stage: Stage,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, ResolveError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ResolveError::Timeout {
                stage,
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
        None => call.await,
    };
    outcome.map_err(|source| ResolveError::collaborator(stage, source))
}
