//! Message domain types.

pub mod payload;
pub mod record;
pub mod types;

pub use record::{MessageRecord, OwnerKey, OwnerKind};
pub use types::{contents_type, display_tag, ForwardSecurityMode, MessageState, MessageType};
