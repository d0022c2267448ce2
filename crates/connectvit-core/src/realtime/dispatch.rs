//! Inbound event dispatch.
//!
//! Transport-independent handling of one decoded [`ClientEvent`] for one
//! session. Replies (acks, errors, pongs) are queued on the session's own
//! outbound queue so they stay ordered with broadcasts.

use std::sync::Arc;

use connectvit_types::error::MessagingError;
use connectvit_types::event::{ClientEvent, ServerEvent};
use tracing::{debug, warn};

use super::pipeline::MessagingService;
use super::session::Session;
use crate::repository::{GroupRepository, MessageRepository};

/// What the transport should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep reading frames.
    Continue,
    /// Close the session.
    Close,
}

/// Decode one text frame.
pub fn decode_frame(text: &str) -> Result<ClientEvent, MessagingError> {
    serde_json::from_str(text)
        .map_err(|e| MessagingError::InvalidMessage(format!("malformed frame: {e}")))
}

/// Handle one inbound event for `session`.
pub async fn handle_event<R>(
    service: &MessagingService<R>,
    session: &Arc<Session>,
    event: ClientEvent,
) -> Disposition
where
    R: MessageRepository + GroupRepository,
{
    let name = event.name();
    if event != ClientEvent::Logout && !session.state().accepts_requests() {
        reply_error(session, &MessagingError::SessionClosed(session.id()));
        return Disposition::Continue;
    }
    debug!(session_id = %session.id(), event = name, "handling event");

    let outcome = match event {
        ClientEvent::Join { sender, receiver } => service
            .join_direct(session, &sender, &receiver)
            .map(|room| Some(ServerEvent::Joined { room })),
        ClientEvent::JoinGroup { username, group_id } => service
            .join_group(session, &username, group_id)
            .map(|room| Some(ServerEvent::Joined { room })),
        ClientEvent::Leave { sender, receiver } => service
            .leave_direct(session, &sender, &receiver)
            .map(|room| Some(ServerEvent::Left { room })),
        ClientEvent::LeaveGroup { group_id, .. } => Ok(Some(ServerEvent::Left {
            room: service.leave_group(session, group_id),
        })),
        ClientEvent::SendMessage {
            sender,
            receiver,
            message,
        } => service
            .send_direct(&sender, &receiver, &message)
            .await
            .map(|_| None),
        ClientEvent::SendGroupMessage {
            group_id,
            sender,
            message,
        } => service
            .send_group(&sender, group_id, &message)
            .await
            .map(|_| None),
        ClientEvent::Ping => Ok(Some(ServerEvent::Pong)),
        ClientEvent::Logout => return Disposition::Close,
    };

    match outcome {
        Ok(Some(reply)) => queue(session, reply),
        Ok(None) => {}
        Err(e) => {
            debug!(session_id = %session.id(), event = name, error = %e, "event rejected");
            reply_error(session, &e);
        }
    }
    Disposition::Continue
}

/// Queue an `error` event describing `err` for `session`.
pub fn reply_error(session: &Session, err: &MessagingError) {
    queue(session, ServerEvent::error(err.code(), err.to_string()));
}

fn queue(session: &Session, event: ServerEvent) {
    if let Err(e) = session.deliver(Arc::new(event)) {
        warn!(session_id = %session.id(), error = %e, "could not queue reply");
    }
}
