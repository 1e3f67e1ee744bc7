//! Instruction set used by the control core.
//!
//! Only the instructions the appliance needs are modelled. Each one maps to a
//! command packet whose payload starts with the instruction code followed by
//! its parameters.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use fingate_core::{Error, FeatureBuffer, Result, SensorCode, SlotId};

use crate::{Packet, PacketKind};

/// A sensor instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `GenImg` (0x01): capture a finger image into the image buffer.
    CaptureImage,

    /// `Img2Tz` (0x02): extract features from the image into a workspace buffer.
    ConvertImage(FeatureBuffer),

    /// `RegModel` (0x05): combine both workspace buffers into a template.
    BuildModel,

    /// `Store` (0x06): write a workspace buffer to a template slot.
    StoreModel { buffer: FeatureBuffer, slot: SlotId },

    /// `LoadChar` (0x07): read a template slot into a workspace buffer.
    LoadModel { buffer: FeatureBuffer, slot: SlotId },

    /// `VfyPwd` (0x13): unlock the module with its password.
    VerifyPassword(u32),

    /// `TemplateNum` (0x1D): number of stored templates.
    TemplateCount,
}

impl Instruction {
    pub fn code(&self) -> u8 {
        match self {
            Instruction::CaptureImage => 0x01,
            Instruction::ConvertImage(_) => 0x02,
            Instruction::BuildModel => 0x05,
            Instruction::StoreModel { .. } => 0x06,
            Instruction::LoadModel { .. } => 0x07,
            Instruction::VerifyPassword(_) => 0x13,
            Instruction::TemplateCount => 0x1D,
        }
    }

    /// Instruction code followed by parameters.
    pub fn payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(5);
        buf.put_u8(self.code());
        match *self {
            Instruction::ConvertImage(buffer) => buf.put_u8(buffer.as_u8()),
            Instruction::StoreModel { buffer, slot } | Instruction::LoadModel { buffer, slot } => {
                buf.put_u8(buffer.as_u8());
                buf.put_u16(slot.get());
            }
            Instruction::VerifyPassword(password) => buf.put_u32(password),
            Instruction::CaptureImage | Instruction::BuildModel | Instruction::TemplateCount => {}
        }
        buf.freeze()
    }

    pub fn to_packet(&self, address: u32) -> Packet {
        Packet::new(address, PacketKind::Command, self.payload())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::CaptureImage => write!(f, "GenImg"),
            Instruction::ConvertImage(buffer) => write!(f, "Img2Tz({})", buffer),
            Instruction::BuildModel => write!(f, "RegModel"),
            Instruction::StoreModel { buffer, slot } => write!(f, "Store({}, {})", buffer, slot),
            Instruction::LoadModel { buffer, slot } => write!(f, "LoadChar({}, {})", buffer, slot),
            Instruction::VerifyPassword(_) => write!(f, "VfyPwd"),
            Instruction::TemplateCount => write!(f, "TemplateNum"),
        }
    }
}

impl TryFrom<&Packet> for Instruction {
    type Error = Error;

    fn try_from(packet: &Packet) -> Result<Self> {
        if packet.kind != PacketKind::Command {
            return Err(Error::InvalidPacket(format!(
                "expected command packet, got {:?}",
                packet.kind
            )));
        }

        let p = &packet.payload;
        let require = |len: usize| -> Result<()> {
            if p.len() < len {
                return Err(Error::InvalidPacket(format!(
                    "instruction {:#04x} needs {} bytes, got {}",
                    p[0],
                    len,
                    p.len()
                )));
            }
            Ok(())
        };

        let Some(&code) = p.first() else {
            return Err(Error::InvalidPacket("empty command payload".into()));
        };

        match code {
            0x01 => Ok(Instruction::CaptureImage),
            0x02 => {
                require(2)?;
                Ok(Instruction::ConvertImage(FeatureBuffer::try_from(p[1])?))
            }
            0x05 => Ok(Instruction::BuildModel),
            0x06 | 0x07 => {
                require(4)?;
                let buffer = FeatureBuffer::try_from(p[1])?;
                let slot = SlotId::new(u16::from_be_bytes([p[2], p[3]]))?;
                if code == 0x06 {
                    Ok(Instruction::StoreModel { buffer, slot })
                } else {
                    Ok(Instruction::LoadModel { buffer, slot })
                }
            }
            0x13 => {
                require(5)?;
                Ok(Instruction::VerifyPassword(u32::from_be_bytes([
                    p[1], p[2], p[3], p[4],
                ])))
            }
            0x1D => Ok(Instruction::TemplateCount),
            other => Err(Error::InvalidPacket(format!(
                "unsupported instruction {:#04x}",
                other
            ))),
        }
    }
}

/// Acknowledgement returned by the module for every instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub code: SensorCode,
    /// Bytes following the confirmation code.
    pub data: Bytes,
}

impl Acknowledgement {
    pub fn new(code: SensorCode) -> Self {
        Self {
            code,
            data: Bytes::new(),
        }
    }

    pub fn with_data(code: SensorCode, data: impl Into<Bytes>) -> Self {
        Self {
            code,
            data: data.into(),
        }
    }

    /// First two data bytes as a big-endian number (template count replies).
    pub fn data_u16(&self) -> Option<u16> {
        match self.data.as_ref() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    pub fn to_packet(&self, address: u32) -> Packet {
        let mut payload = BytesMut::with_capacity(1 + self.data.len());
        payload.put_u8(self.code.0);
        payload.put_slice(&self.data);
        Packet::new(address, PacketKind::Acknowledge, payload.freeze())
    }
}

impl TryFrom<Packet> for Acknowledgement {
    type Error = Error;

    fn try_from(packet: Packet) -> Result<Self> {
        let code = packet.confirmation_code().ok_or_else(|| {
            Error::InvalidPacket(format!("expected acknowledgement, got {}", packet))
        })?;
        Ok(Self {
            code,
            data: packet.payload.slice(1..),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn slot(id: u16) -> SlotId {
        SlotId::new(id).unwrap()
    }

    #[rstest]
    #[case(Instruction::CaptureImage, vec![0x01])]
    #[case(Instruction::ConvertImage(FeatureBuffer::Two), vec![0x02, 0x02])]
    #[case(Instruction::BuildModel, vec![0x05])]
    #[case(Instruction::StoreModel { buffer: FeatureBuffer::One, slot: slot(260) }, vec![0x06, 0x01, 0x01, 0x04])]
    #[case(Instruction::LoadModel { buffer: FeatureBuffer::One, slot: slot(7) }, vec![0x07, 0x01, 0x00, 0x07])]
    #[case(Instruction::VerifyPassword(0), vec![0x13, 0, 0, 0, 0])]
    #[case(Instruction::TemplateCount, vec![0x1D])]
    fn test_instruction_payload(#[case] instruction: Instruction, #[case] expected: Vec<u8>) {
        assert_eq!(instruction.payload().as_ref(), expected.as_slice());
        let parsed = Instruction::try_from(&instruction.to_packet(0xFFFF_FFFF)).unwrap();
        assert_eq!(parsed, instruction);
    }

    #[test]
    fn test_parse_rejects_ack_packet() {
        let packet = Acknowledgement::new(SensorCode::OK).to_packet(0xFFFF_FFFF);
        assert!(Instruction::try_from(&packet).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_store() {
        let packet = Packet::new(0xFFFF_FFFF, PacketKind::Command, vec![0x06, 0x01]);
        assert!(matches!(
            Instruction::try_from(&packet),
            Err(Error::InvalidPacket(_))
        ));
    }

    #[test]
    fn test_parse_rejects_slot_zero() {
        let packet = Packet::new(0xFFFF_FFFF, PacketKind::Command, vec![0x07, 0x01, 0x00, 0x00]);
        assert!(matches!(
            Instruction::try_from(&packet),
            Err(Error::InvalidSlot { slot: 0, .. })
        ));
    }

    #[test]
    fn test_acknowledgement_from_packet() {
        let packet = Packet::new(0xFFFF_FFFF, PacketKind::Acknowledge, vec![0x00, 0x00, 0x2A]);
        let ack = Acknowledgement::try_from(packet).unwrap();
        assert_eq!(ack.code, SensorCode::OK);
        assert_eq!(ack.data_u16(), Some(42));
    }

    #[test]
    fn test_acknowledgement_requires_ack_kind() {
        let packet = Instruction::CaptureImage.to_packet(0xFFFF_FFFF);
        assert!(Acknowledgement::try_from(packet).is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Instruction::CaptureImage.to_string(), "GenImg");
        assert_eq!(
            Instruction::StoreModel {
                buffer: FeatureBuffer::One,
                slot: slot(12)
            }
            .to_string(),
            "Store(1, 12)"
        );
    }
}
