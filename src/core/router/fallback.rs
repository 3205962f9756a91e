use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::completion::{Completion, CompletionClient, CompletionError, CompletionRequest, StreamEvent};
use crate::core::router::Route;

/// Stream output of a routed turn, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// A new candidate is starting; anything streamed before this belongs
    /// to a failed attempt.
    Attempt { model: String, attempt: usize },
    Stream(StreamEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSuccess {
    pub completion: Completion,
    /// The candidate that produced `completion`.
    pub model: String,
    pub attempts: usize,
}

async fn attempt_once(
    client: &dyn CompletionClient,
    request: CompletionRequest,
    events: &mpsc::UnboundedSender<RouteEvent>,
    cancel: &CancellationToken,
) -> Result<Completion, CompletionError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let call = client.stream_completion(request, tx, cancel.clone());
    let forward = async {
        while let Some(event) = rx.recv().await {
            let _ = events.send(RouteEvent::Stream(event));
        }
    };
    let (result, ()) = tokio::join!(call, forward);
    result
}

/// Try each candidate of `route` in order until one completes.
///
/// Partial output of a failed candidate is followed by the next
/// [`RouteEvent::Attempt`] marker. Cancellation and a missing credential end
/// the walk at once; otherwise the turn fails only after the last candidate.
pub async fn complete_with_fallback(
    client: &dyn CompletionClient,
    route: &Route,
    request: CompletionRequest,
    events: &mpsc::UnboundedSender<RouteEvent>,
    cancel: &CancellationToken,
) -> Result<FallbackSuccess, CompletionError> {
    let candidates = route.candidates();
    let total = candidates.len();
    let mut last_error = None;

    for (index, model) in candidates.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }
        let attempt = index + 1;
        let _ = events.send(RouteEvent::Attempt {
            model: model.clone(),
            attempt,
        });

        let mut attempt_request = request.clone();
        attempt_request.model = model.clone();
        debug!(provider = %route.provider, model = %model, attempt, total, "Requesting completion");

        match attempt_once(client, attempt_request, events, cancel).await {
            Ok(completion) => {
                return Ok(FallbackSuccess {
                    completion,
                    model,
                    attempts: attempt,
                })
            }
            Err(err @ (CompletionError::Cancelled | CompletionError::MissingApiKey { .. })) => {
                return Err(err)
            }
            Err(err) => {
                if attempt < total {
                    warn!(model = %model, error = %err, "Model failed; trying next fallback");
                }
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) if total > 1 => Err(CompletionError::Transport(format!(
            "All {total} models failed. Last error: {err}"
        ))),
        Some(err) => Err(err),
        None => Err(CompletionError::Malformed(
            "route has no candidate models".to_string(),
        )),
    }
}
