use crate::config::SignalingMode;
use crate::error::{DeliveryError, RouteError, SessionError};
use crate::session::IceCandidate;
use crate::signaling::{Connection, ConnectionRegistry, SignalingOutput};
use switchboard_core::{Signal, SignalKind, SignalingEnvelope};
use tracing::debug;

/// Decides where an inbound envelope goes.
///
/// In relay mode it is forwarded to the peer named in `to`. In SFU mode it is fed to the
/// sender's media session and any answer comes back to the sender. Either way the
/// envelope's `from` is overwritten with the sender's identity first.
#[derive(Clone)]
pub struct SignalingRouter {
    connections: ConnectionRegistry,
}

impl SignalingRouter {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }

    pub async fn dispatch(
        &self,
        sender: &Connection,
        envelope: SignalingEnvelope,
    ) -> Result<(), RouteError> {
        let envelope = envelope.stamped(sender.peer_id().clone());

        match envelope.kind() {
            None => return Err(RouteError::MissingSignal),
            Some(SignalKind::Unknown) => return Err(RouteError::UnsupportedKind),
            Some(_) => {}
        }

        match sender.mode() {
            SignalingMode::Relay => self.relay(envelope),
            SignalingMode::Sfu => self.negotiate(sender, envelope).await,
        }
    }

    fn relay(&self, envelope: SignalingEnvelope) -> Result<(), RouteError> {
        let to = envelope.to.clone().ok_or(RouteError::MissingRecipient)?;

        // The registry guard is released before the envelope is queued.
        let recipient = self
            .connections
            .lookup(&to)
            .map_err(|_| RouteError::RecipientUnavailable(to.clone()))?;

        debug!(from = ?envelope.from, to = %to, kind = ?envelope.kind(), "Relaying signal");
        recipient.try_deliver(envelope).map_err(|e| match e {
            DeliveryError::QueueFull => RouteError::Backpressure(to),
            DeliveryError::Closed => RouteError::RecipientUnavailable(to),
        })
    }

    async fn negotiate(
        &self,
        sender: &Connection,
        envelope: SignalingEnvelope,
    ) -> Result<(), RouteError> {
        let session = sender.session().ok_or(SessionError::NotJoined)?;
        let Some(signal) = envelope.signal else {
            return Err(RouteError::MissingSignal);
        };

        match signal.kind {
            SignalKind::Offer => {
                debug!(peer = %sender.peer_id(), "Received offer");
                let answer = session.answer(sdp_of(signal, "offer")?).await?;
                sender.handle().send_answer(answer).await;
            }
            SignalKind::Answer => {
                session
                    .set_remote_description(sdp_of(signal, "answer")?)
                    .await?;
            }
            SignalKind::Candidate => {
                let candidate = IceCandidate::from_signal(&signal)
                    .ok_or(RouteError::MissingPayload { kind: "candidate" })?;
                session.trickle(candidate).await?;
            }
            SignalKind::Unknown => return Err(RouteError::UnsupportedKind),
        }
        Ok(())
    }
}

fn sdp_of(signal: Signal, kind: &'static str) -> Result<String, RouteError> {
    signal.sdp.ok_or(RouteError::MissingPayload { kind })
}
