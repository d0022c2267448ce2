//! WebSocket transport for the realtime messaging core.
//!
//! `GET /ws` upgrades the connection and opens a session with the
//! [`SessionManager`](connectvit_core::realtime::SessionManager). One task
//! per connection multiplexes three sources with `tokio::select!`:
//!
//! - the session's outbound queue, written to the socket as JSON text frames;
//! - inbound frames, decoded and handed to the dispatcher;
//! - the server shutdown token.
//!
//! A malformed frame gets an `error` event and then closes only this
//! session. Disconnect, `logout` and shutdown all end in
//! `SessionManager::close`, which removes the session from every room.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use connectvit_core::realtime::{Disposition, decode_frame, handle_event, reply_error};
use connectvit_observe::fields;
use connectvit_types::event::ServerEvent;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::state::AppState;

/// Upgrade an HTTP request to a realtime session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, peer))
}

async fn handle_socket(socket: WebSocket, state: AppState, peer: SocketAddr) {
    let (session, outbound) = state.sessions.open();
    let span = tracing::info_span!(
        fields::SPAN_SESSION,
        { fields::SESSION_ID } = %session.id(),
        { fields::PEER_ADDR } = %peer,
    );

    async move {
        run_session(socket, &state, &session, outbound).await;
        state.sessions.close(&session.id());
        tracing::debug!("WebSocket connection closed");
    }
    .instrument(span)
    .await;
}

async fn run_session(
    socket: WebSocket,
    state: &AppState,
    session: &Arc<connectvit_core::realtime::Session>,
    mut outbound: mpsc::Receiver<Arc<ServerEvent>>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            // --- Outbound queue -> socket ---
            event = outbound.recv() => {
                let Some(event) = event else { break };
                if send_event(&mut ws_sender, &event).await.is_err() {
                    break;
                }
            }

            // --- Socket -> dispatcher ---
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                        Ok(event) => {
                            let frame_span = tracing::debug_span!(
                                fields::SPAN_FRAME,
                                { fields::EVENT_NAME } = event.name(),
                            );
                            let disposition = handle_event(&*state.messaging, session, event)
                                .instrument(frame_span)
                                .await;
                            if disposition == Disposition::Close {
                                flush(&mut ws_sender, &mut outbound).await;
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "closing session after malformed frame");
                            reply_error(session, &err);
                            flush(&mut ws_sender, &mut outbound).await;
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Binary, ping and pong frames are handled by axum.
                    Some(Ok(_)) => {}
                }
            }

            _ = state.shutdown.cancelled() => {
                flush(&mut ws_sender, &mut outbound).await;
                break;
            }
        }
    }

    let _ = ws_sender.send(Message::Close(None)).await;
}

async fn send_event<S>(ws_sender: &mut S, event: &ServerEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(event) {
        Ok(json) => ws_sender
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| ()),
        Err(err) => {
            tracing::warn!("Failed to serialize ServerEvent: {err}");
            Ok(())
        }
    }
}

/// Write whatever is already queued, without waiting for more.
async fn flush<S>(ws_sender: &mut S, outbound: &mut mpsc::Receiver<Arc<ServerEvent>>)
where
    S: Sink<Message> + Unpin,
{
    while let Ok(event) = outbound.try_recv() {
        if send_event(ws_sender, &event).await.is_err() {
            return;
        }
    }
}
