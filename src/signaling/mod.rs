//! WebRTC signaling relay
//!
//! One broadcaster, many viewers. The relay tracks which connection holds
//! the broadcaster slot and forwards offer/answer/candidate messages between
//! the two sides without interpreting them.
//!
//! ## Inbound `type` values
//! - `broadcaster`: claim the slot (a second claimant gets an error and is closed)
//! - `viewer`: receive `{type: "streamStatus", isLive}`
//! - `offer` / `answer` / `candidate`: relay; `target: "broadcaster"` picks the
//!   broadcaster, anything else fans out to the viewer side
//! - `disconnect`: release the slot

pub mod messages;
pub mod registry;
pub mod router;

pub use messages::{ClientMessage, ServerMessage, SignalKind, Target};
pub use registry::{Admission, ConnectionId, ConnectionRegistry, Outbound, Role};
pub use router::{route, Routed};
