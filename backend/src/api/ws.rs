// =============================================================================
// Live snapshot feed over WebSocket
// =============================================================================
//
// `GET /api/v1/ws?token=<token>` upgrades to a socket that receives the full
// StateSnapshot once on connect and again whenever `state_version` moves.
// The version is polled every 500 ms, so bursts of scan results collapse into
// a single frame. Inbound text frames only keep the connection alive.
// =============================================================================

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::auth::validate_token;
use crate::app_state::AppState;

const POLL_EVERY: Duration = Duration::from_millis(500);

#[derive(Deserialize)]
pub struct FeedQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Response {
    if !validate_token(&state, query.token.as_deref().unwrap_or_default()) {
        warn!("snapshot feed refused: bad token");
        return (StatusCode::FORBIDDEN, "Invalid or missing token").into_response();
    }
    ws.on_upgrade(move |socket| feed(socket, state))
}

/// What to do after reading one inbound frame.
enum Inbound {
    Continue,
    Reply(Message),
    Close,
}

fn classify(frame: Option<Result<Message, axum::Error>>) -> Inbound {
    match frame {
        Some(Ok(Message::Ping(payload))) => Inbound::Reply(Message::Pong(payload)),
        Some(Ok(Message::Text(text))) => {
            debug!(len = text.len(), "feed heartbeat");
            Inbound::Continue
        }
        Some(Ok(Message::Pong(_) | Message::Binary(_))) => Inbound::Continue,
        Some(Ok(Message::Close(_))) | None => Inbound::Close,
        Some(Err(e)) => {
            debug!(error = %e, "feed receive error");
            Inbound::Close
        }
    }
}

async fn feed(socket: WebSocket, state: Arc<AppState>) {
    let (mut tx, mut rx) = socket.split();
    let mut frames_sent = 0u64;

    let mut pushed_version = state.current_state_version();
    if push_snapshot(&mut tx, &state).await.is_err() {
        return;
    }
    frames_sent += 1;
    info!("snapshot feed opened");

    let mut ticker = interval(POLL_EVERY);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let version = state.current_state_version();
                if version == pushed_version {
                    continue;
                }
                if push_snapshot(&mut tx, &state).await.is_err() {
                    break;
                }
                pushed_version = version;
                frames_sent += 1;
            }
            frame = rx.next() => match classify(frame) {
                Inbound::Continue => {}
                Inbound::Reply(reply) => {
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Inbound::Close => break,
            }
        }
    }

    info!(frames_sent, "snapshot feed closed");
}

async fn push_snapshot(tx: &mut SplitSink<WebSocket, Message>, state: &AppState) -> Result<(), axum::Error> {
    let snapshot = state.build_snapshot();
    let body = match serde_json::to_string(&snapshot) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "snapshot not serializable; frame skipped");
            return Ok(());
        }
    };
    let seq = state.ws_sequence_number.fetch_add(1, Ordering::Relaxed) + 1;
    tx.send(Message::Text(body.into())).await?;
    debug!(version = snapshot.state_version, seq, "snapshot pushed");
    Ok(())
}
