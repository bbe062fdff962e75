pub mod codec;
pub mod message;

pub use codec::{ClientCodec, DEFAULT_MAX_FRAME_SIZE, ServerCodec, WireCodec};
pub use message::{DoorReport, Request, Response, ScanStatus};
