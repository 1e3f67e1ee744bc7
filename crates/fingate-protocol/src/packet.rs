use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use fingate_core::{Error, Result, SensorCode, constants::PACKET_HEADER};

/// Bytes preceding the payload: header (2), address (4), kind (1), length (2).
pub const PREAMBLE_LEN: usize = 9;

/// Size of the trailing checksum.
pub const CHECKSUM_LEN: usize = 2;

/// Packet identifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Instruction sent to the module.
    Command,
    /// Data packet with more packets following.
    Data,
    /// Acknowledgement sent by the module.
    Acknowledge,
    /// Last data packet of a transfer.
    EndData,
}

impl PacketKind {
    pub fn as_u8(&self) -> u8 {
        match self {
            PacketKind::Command => 0x01,
            PacketKind::Data => 0x02,
            PacketKind::Acknowledge => 0x07,
            PacketKind::EndData => 0x08,
        }
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(PacketKind::Command),
            0x02 => Ok(PacketKind::Data),
            0x07 => Ok(PacketKind::Acknowledge),
            0x08 => Ok(PacketKind::EndData),
            other => Err(Error::UnknownPacketKind(other)),
        }
    }
}

/// A single packet of the R30x sensor protocol.
///
/// # Wire Format
/// All multi-byte fields are big-endian:
///
/// ```text
/// EF 01 | AA AA AA AA | KK | LL LL | payload ... | CC CC
/// hdr     address       kind length               checksum
/// ```
///
/// `length` counts the payload plus the two checksum bytes. The checksum is the
/// low 16 bits of the sum of the kind byte, both length bytes and every payload byte.
///
/// # Examples
/// ```
/// use fingate_protocol::{Packet, PacketKind};
///
/// // GenImg instruction
/// let packet = Packet::new(0xFFFF_FFFF, PacketKind::Command, vec![0x01]);
/// assert_eq!(
///     packet.to_bytes().as_ref(),
///     &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(address: u32, kind: PacketKind, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            kind,
            payload: payload.into(),
        }
    }

    /// Value of the length field.
    pub fn length_field(&self) -> u16 {
        (self.payload.len() + CHECKSUM_LEN) as u16
    }

    pub fn checksum(&self) -> u16 {
        checksum(self.kind.as_u8(), self.length_field(), &self.payload)
    }

    /// Total number of bytes on the wire.
    pub fn size(&self) -> usize {
        PREAMBLE_LEN + self.payload.len() + CHECKSUM_LEN
    }

    /// Append the wire representation to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.size());
        dst.put_u16(PACKET_HEADER);
        dst.put_u32(self.address);
        dst.put_u8(self.kind.as_u8());
        dst.put_u16(self.length_field());
        dst.put_slice(&self.payload);
        dst.put_u16(self.checksum());
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.write_to(&mut buf);
        buf.freeze()
    }

    /// Confirmation code of an acknowledgement packet.
    pub fn confirmation_code(&self) -> Option<SensorCode> {
        if self.kind != PacketKind::Acknowledge {
            return None;
        }
        self.payload.first().copied().map(SensorCode)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{:08X} [{}]",
            self.kind,
            self.address,
            self.payload
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ")
        )
    }
}

/// Compute the packet checksum over kind, length and payload.
pub fn checksum(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [hi, lo] = length.to_be_bytes();
    payload
        .iter()
        .fold(kind as u16 + hi as u16 + lo as u16, |acc, b| {
            acc.wrapping_add(*b as u16)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PacketKind::Command, 0x01)]
    #[case(PacketKind::Data, 0x02)]
    #[case(PacketKind::Acknowledge, 0x07)]
    #[case(PacketKind::EndData, 0x08)]
    fn test_packet_kind_byte(#[case] kind: PacketKind, #[case] raw: u8) {
        assert_eq!(kind.as_u8(), raw);
        assert_eq!(PacketKind::try_from(raw).unwrap(), kind);
    }

    #[test]
    fn test_unknown_packet_kind() {
        assert!(matches!(
            PacketKind::try_from(0x05),
            Err(Error::UnknownPacketKind(0x05))
        ));
    }

    #[test]
    fn test_store_instruction_bytes() {
        // Store buffer 1 at page 4
        let packet = Packet::new(
            0xFFFF_FFFF,
            PacketKind::Command,
            vec![0x06, 0x01, 0x00, 0x04],
        );
        assert_eq!(
            packet.to_bytes().as_ref(),
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x06, 0x06, 0x01, 0x00, 0x04,
                0x00, 0x12
            ]
        );
    }

    #[test]
    fn test_checksum_wraps() {
        let payload = vec![0xFF; 300];
        let sum = checksum(0x02, 302, &payload);
        let expected = (0x02u32 + 0x01 + 0x2E + 0xFF * 300) as u16;
        assert_eq!(sum, expected);
    }

    #[test]
    fn test_confirmation_code() {
        let ack = Packet::new(0xFFFF_FFFF, PacketKind::Acknowledge, vec![0x0A]);
        assert_eq!(ack.confirmation_code(), Some(SensorCode::ENROLL_MISMATCH));

        let cmd = Packet::new(0xFFFF_FFFF, PacketKind::Command, vec![0x01]);
        assert_eq!(cmd.confirmation_code(), None);

        let empty = Packet::new(0xFFFF_FFFF, PacketKind::Acknowledge, Bytes::new());
        assert_eq!(empty.confirmation_code(), None);
    }

    #[test]
    fn test_size() {
        let packet = Packet::new(0, PacketKind::Command, vec![0x01]);
        assert_eq!(packet.size(), 12);
        assert_eq!(packet.to_bytes().len(), packet.size());
    }
}
