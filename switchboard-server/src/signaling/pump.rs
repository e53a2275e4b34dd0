//! The two halves of a connection's pump.
//!
//! The writer is the only owner of the transport's sink and closes it exactly once,
//! when the connection's token is cancelled or a write fails. The reader decodes
//! frames and hands them to the router until the peer goes away, a frame is
//! malformed, or the token is cancelled.

use crate::error::{PumpError, RouteError};
use crate::signaling::{Connection, SignalingRouter};
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use switchboard_core::SignalingEnvelope;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Drains `outbound` into `sink` until `cancel` fires or the sink fails.
pub async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<SignalingEnvelope>,
    cancel: CancellationToken,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            next = outbound.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize envelope: {}", e);
                continue;
            }
        };

        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            sent = sink.send(Message::Text(json.into())) => sent,
        };
        if let Err(e) = sent {
            debug!("Write failed: {}", e);
            cancel.cancel();
            break;
        }
    }

    if let Err(e) = sink.close().await {
        trace!("Error closing transport: {}", e);
    }
}

/// Reads envelopes from `stream` and routes them on behalf of `connection`.
///
/// Returns `Ok` when the peer closes the socket or the connection is cancelled. A
/// transport error or an undecodable text frame ends the loop with an error.
/// Routing failures are logged and the loop goes on.
pub async fn read_loop<R, E>(
    mut stream: R,
    connection: &Connection,
    router: &SignalingRouter,
) -> Result<(), PumpError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let cancel = connection.handle().cancel_token().clone();

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            frame = stream.next() => frame,
        };

        let text = match frame {
            None | Some(Ok(Message::Close(_))) => return Ok(()),
            Some(Err(e)) => return Err(PumpError::Transport(e.to_string())),
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(_)) => continue,
        };

        let envelope: SignalingEnvelope = serde_json::from_str(text.as_str())?;

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            routed = router.dispatch(connection, envelope) => {
                if let Err(e) = routed {
                    log_route_error(connection, &e);
                }
            }
        }
    }
}

fn log_route_error(connection: &Connection, err: &RouteError) {
    let peer = connection.peer_id();
    match err {
        RouteError::MissingSignal => debug!(peer = %peer, "Ignoring envelope: {}", err),
        RouteError::RecipientUnavailable(_) | RouteError::Backpressure(_) => {
            warn!(peer = %peer, "Dropped envelope: {}", err)
        }
        RouteError::Session(_) => warn!(peer = %peer, "Session signaling failed: {}", err),
        _ => warn!(peer = %peer, "Rejected envelope: {}", err),
    }
}
