//! # SKIRMISH Networking
//!
//! Wire framing between a simulation and whatever transport carries it.
//! Sockets, sessions and reconciliation live elsewhere; this crate only
//! turns state into bytes and back.
//!
//! ## Frames
//!
//! ```text
//! HOST                                  PEER
//!   |                                     |
//!   |--- TransformSync (per tick) ------->|  decode_transform_frame
//!   |<-- Input (per local input) ---------|  InputPacket
//!   |                                     |
//! ```
//!
//! All multi-byte values are little-endian.
//!
//! ## Example
//!
//! ```rust
//! use skirmish_networking::protocol::{decode_transform_frame, FrameEncoder, TransformRecord};
//!
//! let mut encoder = FrameEncoder::new();
//! let records = [TransformRecord { id: "p1", x: 1.0, y: 2.0, vx: 0.0, vy: 0.0 }];
//! let bytes = encoder.encode(&records, 42).expect("fits").to_vec();
//!
//! let mut seen = 0;
//! assert_eq!(decode_transform_frame(&bytes, |_, _, _, _, _| seen += 1), Some(42));
//! assert_eq!(seen, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod protocol;

pub use error::ProtocolError;
pub use protocol::{
    decode_transform_frame, FrameEncoder, InputPacket, PacketType, TransformRecord,
};
