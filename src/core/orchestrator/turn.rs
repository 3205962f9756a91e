use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::backends::ClientRegistry;
use crate::core::chat::ChatConfig;
use crate::core::completion::{CompletionError, CompletionRequest, StreamEvent};
use crate::core::message::Message;
use crate::core::orchestrator::OrchestratorEvent;
use crate::core::router::{complete_with_fallback, FallbackSuccess, Route, RouteEvent, Router};
use crate::core::session::Pane;

/// Progress of one turn, reported back to the orchestrator loop.
#[derive(Debug)]
pub enum TurnEvent {
    Routed(Route),
    Attempt { model: String, attempt: usize },
    Stream(StreamEvent),
    Finished(Result<FallbackSuccess, CompletionError>),
}

pub(crate) struct TurnContext {
    pub pane: Pane,
    pub turn_id: u64,
    pub chat_id: String,
    pub selector: ChatConfig,
    pub history: Vec<Message>,
    pub window: Vec<Message>,
    pub system: Option<String>,
    pub api_keys: HashMap<String, String>,
    pub router: Router,
    pub clients: ClientRegistry,
    pub cancel: CancellationToken,
}

pub(crate) fn spawn_turn(ctx: TurnContext, tx: mpsc::UnboundedSender<OrchestratorEvent>) {
    tokio::spawn(async move {
        let (pane, turn_id) = (ctx.pane, ctx.turn_id);
        let result = run_turn(ctx, &tx).await;
        let _ = tx.send(OrchestratorEvent::Turn {
            pane,
            turn_id,
            event: TurnEvent::Finished(result),
        });
    });
}

async fn run_turn(
    ctx: TurnContext,
    tx: &mpsc::UnboundedSender<OrchestratorEvent>,
) -> Result<FallbackSuccess, CompletionError> {
    let TurnContext {
        pane,
        turn_id,
        chat_id,
        selector,
        history,
        window,
        system,
        api_keys,
        router,
        clients,
        cancel,
    } = ctx;
    let report = |event: TurnEvent| {
        let _ = tx.send(OrchestratorEvent::Turn {
            pane,
            turn_id,
            event,
        });
    };

    let route = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
        route = router.resolve(&chat_id, &selector, &history) => route,
    };
    report(TurnEvent::Routed(route.clone()));

    let client = clients
        .get(&route.provider)
        .ok_or_else(|| CompletionError::NoBackend {
            provider: route.provider.clone(),
        })?;
    let api_key = api_keys.get(&route.provider).cloned().unwrap_or_default();
    let request = CompletionRequest::new(route.model.clone(), window)
        .with_system(system)
        .with_api_key(api_key);

    let (route_tx, mut route_rx) = mpsc::unbounded_channel();
    let attempts = async {
        let result =
            complete_with_fallback(client.as_ref(), &route, request, &route_tx, &cancel).await;
        drop(route_tx);
        result
    };
    let forward = async {
        while let Some(event) = route_rx.recv().await {
            report(match event {
                RouteEvent::Attempt { model, attempt } => TurnEvent::Attempt { model, attempt },
                RouteEvent::Stream(event) => TurnEvent::Stream(event),
            });
        }
    };
    let (result, ()) = tokio::join!(attempts, forward);
    result
}
