//! Wire protocol spoken with the game authority.
//!
//! Every frame is a JSON text message of the form
//! `{"type": <kind>, "data": <kind-specific object>}`.

mod codec;
mod messages;

pub use codec::{decode, decode_client, encode, encode_event};
pub use messages::{ClientMessage, ServerEvent, Snapshot, Verdict};
