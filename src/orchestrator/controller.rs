//! Submission lifecycle controller.
//!
//! Receives submission commands from a presentation layer and keeps at most
//! one request in flight, aborting a superseded request when a new
//! submission arrives. Events are tagged with the request id so stale
//! responses can be discarded by the view layer.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::client::AnalysisClient;
use crate::model::{AnalysisEvent, RunConfig};
use crate::request::RequestPayload;
use crate::view::RequestId;

/// Commands emitted by presentation layers.
#[derive(Debug)]
pub enum UiCommand {
    Submit {
        request_id: RequestId,
        payload: RequestPayload,
    },
    Quit,
}

/// Run submissions until the command channel closes or `Quit` arrives.
pub async fn run_controller(
    cfg: &RunConfig,
    event_tx: UnboundedSender<AnalysisEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let client = Arc::new(AnalysisClient::new(cfg)?);
    let mut in_flight: Option<tokio::task::JoinHandle<()>> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit { request_id, payload }) => {
                        // A fresh submission supersedes whatever is still in
                        // flight: the view has already dropped the old id, so
                        // any late events from the old task would be discarded
                        // as stale anyway.
                        if let Some(handle) = in_flight.take() {
                            warn!(?request_id, "aborting superseded in-flight request");
                            handle.abort();
                        }
                        let _ = event_tx.send(AnalysisEvent::Started { request_id });
                        let client = client.clone();
                        let tx = event_tx.clone();
                        in_flight = Some(tokio::spawn(async move {
                            match client.submit(payload).await {
                                Ok(result) => {
                                    let _ = tx.send(AnalysisEvent::Completed {
                                        request_id,
                                        result: Box::new(result),
                                    });
                                }
                                Err(error) => {
                                    let _ = tx.send(AnalysisEvent::Failed { request_id, error });
                                }
                            }
                        }));
                    }
                    Some(UiCommand::Quit) | None => {
                        // Abort rather than wait: the view layer has already
                        // lost interest in any pending response.
                        if let Some(handle) = in_flight.take() {
                            handle.abort();
                        }
                        break;
                    }
                }
            }
            // Observe completion of the in-flight task without taking the
            // handle out; taking it in a losing select branch would drop it.
            _ = async {
                match in_flight.as_mut() {
                    Some(handle) => {
                        let _ = handle.await;
                    }
                    None => futures::future::pending::<()>().await,
                }
            } => {
                in_flight = None;
            }
        }
    }

    Ok(())
}
