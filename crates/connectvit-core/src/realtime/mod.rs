//! Real-time messaging and room membership.
//!
//! - `addressing` -- canonical room ids for direct pairs and groups
//! - `session` -- per-connection state machine and the `SessionManager`
//! - `registry` -- `RoomRegistry`: room id -> joined sessions, fan-out
//! - `pipeline` -- `MessagingService`: validate, persist, then broadcast
//! - `dispatch` -- maps inbound `ClientEvent`s onto the above

pub mod addressing;
pub mod dispatch;
pub mod pipeline;
pub mod registry;
pub mod session;

pub use addressing::{parse_room, room_for_direct, room_for_group, validate_identity};
pub use dispatch::{decode_frame, handle_event, reply_error, Disposition};
pub use pipeline::MessagingService;
pub use registry::{BroadcastReport, RoomRegistry};
pub use session::{DeliveryError, Session, SessionManager};
