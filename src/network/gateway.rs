//! Gateway - the websocket session that receives `MESSAGE_CREATE` events.
//!
//! One session is: connect, wait for HELLO, IDENTIFY, then heartbeat on the
//! advertised interval while forwarding dispatches. RECONNECT, INVALID_SESSION
//! a close frame, or a missed heartbeat ACK end the session; [`GatewayClient::run`]
//! then reconnects with capped exponential backoff plus jitter.

use super::GatewayError;
use crate::config::GatewayConfig;
use crate::metrics;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::time::Duration;
use stickyd_proto::{GatewayPayload, Hello, Identify, MessageCreate, opcode};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, instrument, warn};

const HELLO_TIMEOUT: Duration = Duration::from_secs(30);

/// Close codes after which reconnecting with the same settings is pointless.
const FATAL_CLOSE_CODES: &[u16] = &[
    4004, // authentication failed
    4010, // invalid shard
    4011, // sharding required
    4012, // invalid API version
    4013, // invalid intents
    4014, // disallowed intents
];

/// Why a session ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server asked for a reconnect.
    Reconnect,
    /// The session was invalidated.
    InvalidSession,
    /// The server closed the socket.
    Closed(Option<String>),
    /// No ACK arrived between two heartbeats.
    Zombie,
    /// The event receiver went away; stickyd is shutting down.
    Shutdown,
}

/// What to do with one decoded frame.
#[derive(Debug, PartialEq)]
enum Action {
    SendHeartbeat,
    Ack,
    Dispatch(Box<MessageCreate>),
    End(SessionEnd),
    Ignore,
}

pub struct GatewayClient {
    config: GatewayConfig,
    token: String,
    events: mpsc::Sender<MessageCreate>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, token: String, events: mpsc::Sender<MessageCreate>) -> Self {
        Self {
            config,
            token,
            events,
        }
    }

    /// Keep a session open until the receiver is dropped or the gateway
    /// rejects stickyd for good.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> Result<(), GatewayError> {
        let mut failures: u32 = 0;

        loop {
            metrics::record_gateway_session();
            match self.session().await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Event receiver closed, leaving gateway");
                    return Ok(());
                }
                Ok(end) => {
                    info!(reason = ?end, "Gateway session ended");
                    failures = 0;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Gateway rejected the session");
                    return Err(e);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %e, failures, "Gateway session failed");
                }
            }

            let delay = jittered(self.config.backoff(failures));
            debug!(delay_ms = delay.as_millis() as u64, "Reconnecting to gateway");
            tokio::time::sleep(delay).await;
        }
    }

    async fn session(&self) -> Result<SessionEnd, GatewayError> {
        let (socket, _) = connect_async(self.config.url.as_str()).await?;
        let (mut write, mut read) = socket.split();
        debug!(url = %self.config.url, "Gateway connected");

        let hello = tokio::time::timeout(HELLO_TIMEOUT, async {
            while let Some(frame) = read.next().await {
                if let Message::Text(text) = frame? {
                    return Ok(serde_json::from_str::<GatewayPayload>(&text)?);
                }
            }
            Err(GatewayError::Protocol("closed before HELLO".into()))
        })
        .await
        .map_err(|_| GatewayError::HelloTimeout(HELLO_TIMEOUT))??;

        if hello.op != opcode::HELLO {
            return Err(GatewayError::Protocol(format!(
                "expected HELLO, got opcode {}",
                hello.op
            )));
        }
        let hello: Hello = hello
            .data()
            .ok_or_else(|| GatewayError::Protocol("HELLO without heartbeat_interval".into()))?;
        let interval = Duration::from_millis(hello.heartbeat_interval.max(1));

        let identify = GatewayPayload::identify(&Identify::new(&self.token, self.config.intents));
        write
            .send(Message::Text(serde_json::to_string(&identify)?))
            .await?;
        info!(heartbeat_ms = hello.heartbeat_interval, "Identified with gateway");

        // The first beat lands at a random point within the interval.
        let first = interval.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        let mut heartbeat = tokio::time::interval_at(Instant::now() + first, interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut seq: Option<u64> = None;
        let mut acked = true;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !acked {
                        return Ok(SessionEnd::Zombie);
                    }
                    acked = false;
                    send_heartbeat(&mut write, seq).await?;
                }
                frame = read.next() => {
                    let text = match frame {
                        None => return Ok(SessionEnd::Closed(None)),
                        Some(frame) => match frame? {
                            Message::Text(text) => text,
                            Message::Close(close) => {
                                let Some(close) = close else {
                                    return Ok(SessionEnd::Closed(None));
                                };
                                let code = u16::from(close.code);
                                if FATAL_CLOSE_CODES.contains(&code) {
                                    return Err(GatewayError::Fatal {
                                        code,
                                        reason: close.reason.into_owned(),
                                    });
                                }
                                return Ok(SessionEnd::Closed(Some(format!("{code} {}", close.reason))));
                            }
                            _ => continue,
                        },
                    };

                    let payload: GatewayPayload = serde_json::from_str(&text)?;
                    match classify(payload, &mut seq) {
                        Action::SendHeartbeat => send_heartbeat(&mut write, seq).await?,
                        Action::Ack => acked = true,
                        Action::Dispatch(message) => {
                            if self.events.send(*message).await.is_err() {
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                        Action::End(end) => return Ok(end),
                        Action::Ignore => {}
                    }
                }
            }
        }
    }
}

async fn send_heartbeat<S>(write: &mut S, seq: Option<u64>) -> Result<(), GatewayError>
where
    S: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let beat = serde_json::to_string(&GatewayPayload::heartbeat(seq))?;
    write.send(Message::Text(beat)).await?;
    Ok(())
}

/// Decide what a frame means, tracking the last sequence number.
fn classify(payload: GatewayPayload, seq: &mut Option<u64>) -> Action {
    if let Some(s) = payload.s {
        *seq = Some(s);
    }

    match payload.op {
        opcode::DISPATCH if payload.is_dispatch("MESSAGE_CREATE") => {
            match payload.data::<MessageCreate>() {
                Some(message) => Action::Dispatch(Box::new(message)),
                None => {
                    warn!("Undecodable MESSAGE_CREATE dispatch");
                    Action::Ignore
                }
            }
        }
        opcode::DISPATCH => {
            if payload.is_dispatch("READY") {
                info!("Gateway session ready");
            }
            Action::Ignore
        }
        opcode::HEARTBEAT => Action::SendHeartbeat,
        opcode::HEARTBEAT_ACK => Action::Ack,
        opcode::RECONNECT => Action::End(SessionEnd::Reconnect),
        opcode::INVALID_SESSION => Action::End(SessionEnd::InvalidSession),
        op => {
            debug!(op, "Ignoring gateway opcode");
            Action::Ignore
        }
    }
}

/// Add up to 50% random jitter to a reconnect delay.
fn jittered(base: Duration) -> Duration {
    let spread = (base.as_millis() as u64) / 2;
    let extra = if spread == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=spread)
    };
    base + Duration::from_millis(extra)
}
