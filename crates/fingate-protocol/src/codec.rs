//! Tokio codec for sensor packet framing.
//!
//! `SensorCodec` implements [`Decoder`] and [`Encoder<Packet>`] so a serial
//! port (or any `AsyncRead + AsyncWrite`) can be wrapped in a `Framed` stream
//! of [`Packet`]s.
//!
//! ```text
//! serial bytes -> Decoder -> Packet (checksum verified)
//! Packet -> Encoder -> serial bytes
//! ```
//!
//! # Resynchronisation
//!
//! Bytes before the `EF 01` header are discarded, so line noise between
//! packets does not stall the stream. A corrupt packet is consumed and
//! reported as an error; decoding resumes with the bytes that follow it.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio_util::codec::Framed;
//! use fingate_protocol::{Instruction, SensorCodec};
//!
//! # async fn example<T>(port: T) -> fingate_core::Result<()>
//! # where T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin {
//! let mut framed = Framed::new(port, SensorCodec::new());
//! framed.send(Instruction::CaptureImage.to_packet(0xFFFF_FFFF)).await?;
//!
//! if let Some(Ok(reply)) = framed.next().await {
//!     println!("confirmation: {:?}", reply.confirmation_code());
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use fingate_core::{Error, Result, constants::PACKET_HEADER};

use crate::packet::{CHECKSUM_LEN, PREAMBLE_LEN, checksum};
use crate::{Packet, PacketKind};

/// Default maximum payload size in bytes.
///
/// The largest data packet the module sends carries 256 bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 256;

const HEADER: [u8; 2] = PACKET_HEADER.to_be_bytes();

/// Tokio codec for sensor packets.
#[derive(Debug, Clone)]
pub struct SensorCodec {
    max_payload: usize,
}

impl SensorCodec {
    pub fn new() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Create a codec with a custom payload limit.
    ///
    /// ```
    /// use fingate_protocol::SensorCodec;
    ///
    /// let codec = SensorCodec::with_max_payload(128);
    /// assert_eq!(codec.max_payload(), 128);
    /// ```
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Drop everything before the next header. Returns `false` if none is buffered.
    fn skip_to_header(src: &mut BytesMut) -> bool {
        match src.windows(2).position(|w| w == HEADER) {
            Some(pos) => {
                src.advance(pos);
                true
            }
            None => {
                // Keep a trailing first header byte; the second may still arrive.
                let keep = usize::from(src.last() == Some(&HEADER[0]));
                let len = src.len();
                src.advance(len - keep);
                false
            }
        }
    }
}

impl Default for SensorCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SensorCodec {
    type Item = Packet;
    type Error = Error;

    /// Decode one packet from the byte stream.
    ///
    /// # Errors
    /// - `Error::InvalidPacket` if the length field is smaller than the checksum
    /// - `Error::PacketTooLarge` if the payload exceeds the configured limit
    /// - `Error::ChecksumMismatch` if the trailing checksum is wrong
    /// - `Error::UnknownPacketKind` for an unrecognised identifier byte
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if !Self::skip_to_header(src) || src.len() < PREAMBLE_LEN {
            return Ok(None);
        }

        let length = u16::from_be_bytes([src[7], src[8]]);
        if (length as usize) < CHECKSUM_LEN {
            src.advance(HEADER.len());
            return Err(Error::InvalidPacket(format!(
                "length field {} shorter than checksum",
                length
            )));
        }

        let payload_len = length as usize - CHECKSUM_LEN;
        if payload_len > self.max_payload {
            src.advance(HEADER.len());
            return Err(Error::PacketTooLarge {
                size: payload_len,
                max_size: self.max_payload,
            });
        }

        let total = PREAMBLE_LEN + length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut raw = src.split_to(total);
        raw.advance(HEADER.len());
        let address = raw.get_u32();
        let kind_byte = raw.get_u8();
        raw.advance(2);
        let payload = raw.split_to(payload_len).freeze();
        let actual = raw.get_u16();

        let expected = checksum(kind_byte, length, &payload);
        if expected != actual {
            return Err(Error::ChecksumMismatch { expected, actual });
        }

        let kind = PacketKind::try_from(kind_byte)?;
        Ok(Some(Packet {
            address,
            kind,
            payload,
        }))
    }
}

impl Encoder<Packet> for SensorCodec {
    type Error = Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        if item.payload.len() > self.max_payload {
            return Err(Error::PacketTooLarge {
                size: item.payload.len(),
                max_size: self.max_payload,
            });
        }
        item.write_to(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Instruction;
    use fingate_core::SensorCode;

    const ADDR: u32 = 0xFFFF_FFFF;

    fn ack_bytes(code: u8) -> Vec<u8> {
        Packet::new(ADDR, PacketKind::Acknowledge, vec![code])
            .to_bytes()
            .to_vec()
    }

    #[test]
    fn test_codec_default() {
        assert_eq!(SensorCodec::default().max_payload(), DEFAULT_MAX_PAYLOAD);
    }

    #[test]
    fn test_decode_complete_packet() {
        let mut codec = SensorCodec::new();
        let mut buffer = BytesMut::from(&ack_bytes(0x02)[..]);

        let packet = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(packet.kind, PacketKind::Acknowledge);
        assert_eq!(packet.address, ADDR);
        assert_eq!(packet.confirmation_code(), Some(SensorCode::NO_FINGER));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_partial_packet() {
        let mut codec = SensorCodec::new();
        let bytes = ack_bytes(0x00);
        let mut buffer = BytesMut::from(&bytes[..6]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(&bytes[6..]);
        assert!(codec.decode(&mut buffer).unwrap().is_some());
    }

    #[test]
    fn test_decode_multiple_packets_in_buffer() {
        let mut codec = SensorCodec::new();
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(&ack_bytes(0x00));
        buffer.extend_from_slice(&ack_bytes(0x0A));

        let first = codec.decode(&mut buffer).unwrap().unwrap();
        let second = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.confirmation_code(), Some(SensorCode::OK));
        assert_eq!(second.confirmation_code(), Some(SensorCode::ENROLL_MISMATCH));
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_skips_noise_before_header() {
        let mut codec = SensorCodec::new();
        let mut buffer = BytesMut::from(&[0x00, 0x13, 0x37][..]);
        buffer.extend_from_slice(&ack_bytes(0x00));

        let packet = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(packet.confirmation_code(), Some(SensorCode::OK));
    }

    #[test]
    fn test_decode_keeps_split_header_byte() {
        let mut codec = SensorCodec::new();
        let bytes = ack_bytes(0x00);
        let mut buffer = BytesMut::from(&[0x42, 0x42, bytes[0]][..]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.as_ref(), &[0xEF]);

        buffer.extend_from_slice(&bytes[1..]);
        assert!(codec.decode(&mut buffer).unwrap().is_some());
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut codec = SensorCodec::new();
        let mut bytes = ack_bytes(0x00);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let mut buffer = BytesMut::from(&bytes[..]);
        buffer.extend_from_slice(&ack_bytes(0x09));

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::ChecksumMismatch { .. })
        ));

        // The corrupt packet was consumed
        let next = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(next.confirmation_code(), Some(SensorCode::NOT_FOUND));
    }

    #[test]
    fn test_decode_rejects_short_length() {
        let mut codec = SensorCodec::new();
        let mut buffer =
            BytesMut::from(&[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x01][..]);

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::InvalidPacket(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_payload() {
        let mut codec = SensorCodec::with_max_payload(8);
        let packet = Packet::new(ADDR, PacketKind::Data, vec![0u8; 9]);
        let mut buffer = BytesMut::from(packet.to_bytes().as_ref());

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::PacketTooLarge { size: 9, max_size: 8 })
        ));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let mut codec = SensorCodec::new();
        // kind 0x05 with a valid checksum
        let sum = checksum(0x05, 3, &[0x00]);
        let [hi, lo] = sum.to_be_bytes();
        let mut buffer = BytesMut::from(
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x05, 0x00, 0x03, 0x00, hi, lo][..],
        );

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::UnknownPacketKind(0x05))
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_encode_instruction() {
        let mut codec = SensorCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Instruction::CaptureImage.to_packet(ADDR), &mut buffer)
            .unwrap();
        assert_eq!(
            buffer.as_ref(),
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
        );
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let mut codec = SensorCodec::with_max_payload(4);
        let mut buffer = BytesMut::new();
        let packet = Packet::new(ADDR, PacketKind::Data, vec![0u8; 5]);

        assert!(codec.encode(packet, &mut buffer).is_err());
        assert!(buffer.is_empty());
    }
}
