//! # Packet Definitions
//!
//! Frame type tags and the fixed-size input packet.
//!
//! ## Zero-Allocation Design
//!
//! [`InputPacket`] is `Copy`, `Pod` and exactly 16 bytes, so it is read and
//! written with a single copy and no parsing.

use bytemuck::{Pod, Zeroable};
use skirmish_shared::Vec2;

/// Leading byte of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Peer -> Host: one player's input.
    Input = 1,
    /// Host -> Peer: positions and velocities of replicated entities.
    TransformSync = 2,
}

impl PacketType {
    /// Decodes a type byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Input),
            2 => Some(Self::TransformSync),
            _ => None,
        }
    }
}

/// Player input packet - Peer -> Host.
///
/// Size: 16 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InputPacket {
    /// Tick the input was sampled for.
    pub tick: u32,
    /// Move direction X, `-127..=127` maps to `-1.0..=1.0`.
    pub move_x: i8,
    /// Move direction Y.
    pub move_y: i8,
    /// Action bitmask (fire, dash).
    pub actions: u8,
    /// Padding for alignment.
    pub _padding: u8,
    /// Aim point X in world units.
    pub aim_x: f32,
    /// Aim point Y in world units.
    pub aim_y: f32,
}

impl InputPacket {
    /// Size in bytes.
    pub const SIZE: usize = 16;

    /// Action: fire the equipped weapon.
    pub const ACTION_FIRE: u8 = 1 << 0;
    /// Action: dash.
    pub const ACTION_DASH: u8 = 1 << 1;

    /// Packs a move direction, aim point and actions.
    ///
    /// Each move component is clamped to `[-1, 1]` and quantized to `i8`.
    #[must_use]
    pub fn new(tick: u32, move_dir: Vec2, aim: Vec2, actions: u8) -> Self {
        Self {
            tick,
            move_x: quantize(move_dir.x),
            move_y: quantize(move_dir.y),
            actions,
            _padding: 0,
            aim_x: aim.x,
            aim_y: aim.y,
        }
    }

    /// Dequantized move direction.
    #[inline]
    #[must_use]
    pub fn move_dir(&self) -> Vec2 {
        Vec2::new(f32::from(self.move_x) / 127.0, f32::from(self.move_y) / 127.0)
    }

    /// Aim point.
    #[inline]
    #[must_use]
    pub const fn aim(&self) -> Vec2 {
        Vec2::new(self.aim_x, self.aim_y)
    }

    /// Returns true if the fire action is set.
    #[inline]
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.actions & Self::ACTION_FIRE != 0
    }

    /// Returns true if the dash action is set.
    #[inline]
    #[must_use]
    pub const fn is_dashing(&self) -> bool {
        self.actions & Self::ACTION_DASH != 0
    }
}

#[inline]
fn quantize(value: f32) -> i8 {
    if value.is_finite() {
        (value.clamp(-1.0, 1.0) * 127.0).round() as i8
    } else {
        0
    }
}

/// Writes `[Input][packet]` into `out`, replacing its contents.
pub fn encode_input_packet(packet: &InputPacket, out: &mut Vec<u8>) {
    out.clear();
    out.push(PacketType::Input as u8);
    out.extend_from_slice(bytemuck::bytes_of(packet));
}

/// Reads a framed input packet.
///
/// Returns `None` unless `bytes` is exactly one type byte of
/// [`PacketType::Input`] followed by [`InputPacket::SIZE`] bytes.
#[must_use]
pub fn decode_input_packet(bytes: &[u8]) -> Option<InputPacket> {
    let (&tag, body) = bytes.split_first()?;
    if PacketType::from_u8(tag) != Some(PacketType::Input) || body.len() != InputPacket::SIZE {
        return None;
    }
    bytemuck::try_pod_read_unaligned(body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_packet_size() {
        assert_eq!(std::mem::size_of::<InputPacket>(), InputPacket::SIZE);
    }

    #[test]
    fn test_input_round_trip() {
        let packet = InputPacket::new(
            900,
            Vec2::new(1.0, -0.5),
            Vec2::new(321.5, 12.25),
            InputPacket::ACTION_FIRE | InputPacket::ACTION_DASH,
        );
        let mut bytes = Vec::new();
        encode_input_packet(&packet, &mut bytes);
        assert_eq!(bytes.len(), 1 + InputPacket::SIZE);

        let decoded = decode_input_packet(&bytes).unwrap();
        assert_eq!(decoded, packet);
        assert!(decoded.is_firing());
        assert!(decoded.is_dashing());
        assert_eq!(decoded.move_dir().x, 1.0);
        assert!((decoded.move_dir().y + 0.5).abs() < 0.01);
        assert_eq!(decoded.aim(), Vec2::new(321.5, 12.25));
    }

    #[test]
    fn test_quantize_clamps_and_zeroes_nan() {
        let packet = InputPacket::new(0, Vec2::new(5.0, f32::NAN), Vec2::ZERO, 0);
        assert_eq!(packet.move_x, 127);
        assert_eq!(packet.move_y, 0);
    }

    #[test]
    fn test_decode_rejects_wrong_tag_or_length() {
        let mut bytes = Vec::new();
        encode_input_packet(&InputPacket::default(), &mut bytes);

        let mut wrong_tag = bytes.clone();
        wrong_tag[0] = PacketType::TransformSync as u8;
        assert!(decode_input_packet(&wrong_tag).is_none());

        assert!(decode_input_packet(&bytes[..bytes.len() - 1]).is_none());
        bytes.push(0);
        assert!(decode_input_packet(&bytes).is_none());
        assert!(decode_input_packet(&[]).is_none());
    }
}
