//! # Network Protocol
//!
//! Binary framing with a one-byte type tag in front of every frame.
//!
//! ## Transform Sync Frame
//!
//! ```text
//! ┌──────────┬───────────────┬───────────┐
//! │ Type (1) │ Timestamp (4) │ Count (2) │
//! ├──────────┴───────────────┴───────────┤
//! │ Count × record                       │
//! │ IdLen (1) │ Id (IdLen) │ X │ Y │ VX │ VY  (f32 each)
//! └──────────────────────────────────────┘
//! ```
//!
//! ## Input Packet
//!
//! ```text
//! ┌──────────┬────────────────────────┐
//! │ Type (1) │ InputPacket (16, Pod)  │
//! └──────────┴────────────────────────┘
//! ```

mod frame;
mod packets;

pub use frame::{
    decode_transform_frame, FrameEncoder, FrameReader, TransformRecord, FRAME_HEADER_SIZE,
    MAX_FRAME_ENTITIES, MAX_ID_LEN, RECORD_FIXED_SIZE,
};
pub use packets::{decode_input_packet, encode_input_packet, InputPacket, PacketType};
