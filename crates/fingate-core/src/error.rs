use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Domain errors
    #[error("Invalid slot ID {slot}: must be between {min} and {max}")]
    InvalidSlot { slot: u16, min: u16, max: u16 },

    #[error("Invalid feature buffer: {0}")]
    InvalidBuffer(u8),

    #[error("Invalid display line {line}: must be between 0 and {max}")]
    InvalidLine { line: usize, max: usize },

    // Protocol errors
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("Packet too large: {size} bytes (max {max_size})")]
    PacketTooLarge { size: usize, max_size: usize },

    #[error("Unknown packet kind: {0:#04x}")]
    UnknownPacketKind(u8),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
