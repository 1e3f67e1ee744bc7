//! Wire protocol for R30x-family fingerprint modules.
//!
//! - [`Packet`]: a single framed packet with checksum
//! - [`Instruction`] / [`Acknowledgement`]: typed command and reply payloads
//! - [`SensorCodec`]: Tokio codec for `Framed` serial streams

pub mod codec;
pub mod instruction;
pub mod packet;

pub use codec::SensorCodec;
pub use instruction::{Acknowledgement, Instruction};
pub use packet::{Packet, PacketKind, checksum};
