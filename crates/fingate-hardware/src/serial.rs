//! Fingerprint sensor driver over an async byte stream.
//!
//! [`SerialSensor`] frames each [`Instruction`] with [`SensorCodec`], sends
//! it, and waits for the acknowledgement. Any `AsyncRead + AsyncWrite` works:
//! a serial port, a TCP bridge, or a `tokio::io::duplex` pipe in tests.
//!
//! The protocol carries no sequence numbers, so each transaction starts by
//! discarding whatever an earlier one left behind: a late acknowledgement,
//! the rest of a corrupt packet, or bytes already sitting in the read buffer.
//!
//! Workflows only see [`SensorCode`]s. Transport problems are logged and then
//! reported as [`SensorCode::TIMEOUT`] or [`SensorCode::PACKET_RECEIVE_ERROR`],
//! the same codes the module's own library returns for them.

use std::fmt;
use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use fingate_core::constants::{DEFAULT_ACK_TIMEOUT_MS, DEFAULT_SENSOR_ADDRESS};
use fingate_core::{FeatureBuffer, SensorCode, SlotId};
use fingate_protocol::{Acknowledgement, Instruction, Packet, PacketKind, SensorCodec};

use crate::error::{HardwareError, Result};
use crate::traits::{BuildError, CaptureOutcome, FingerprintSensor, SensorResult};

/// R30x-family sensor on a byte stream.
pub struct SerialSensor<T> {
    framed: Framed<T, SensorCodec>,
    address: u32,
    ack_timeout: Duration,
    /// The last transaction timed out, so its acknowledgement may still come.
    late_ack_pending: bool,
}

impl<T> fmt::Debug for SerialSensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialSensor")
            .field("address", &format_args!("{:08X}", self.address))
            .field("ack_timeout", &self.ack_timeout)
            .field("late_ack_pending", &self.late_ack_pending)
            .finish_non_exhaustive()
    }
}

/// Byte stream a [`SerialSensor`] can run on.
pub trait SensorLink: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SensorLink for T {}

/// Type-erased link, for choosing the transport at runtime.
pub type BoxedLink = Box<dyn SensorLink>;

impl<T> SerialSensor<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream without a handshake.
    pub fn new(io: T) -> Self {
        Self {
            framed: Framed::new(io, SensorCodec::new()),
            address: DEFAULT_SENSOR_ADDRESS,
            ack_timeout: Duration::from_millis(DEFAULT_ACK_TIMEOUT_MS),
            late_ack_pending: false,
        }
    }

    /// Wrap a stream and unlock the module with `password`.
    ///
    /// # Errors
    /// Returns `HardwareError::HandshakeRejected` if the module refuses the
    /// password, or the transport error if it does not answer.
    pub async fn connect(io: T, password: u32) -> Result<Self> {
        let mut sensor = Self::new(io);
        sensor.verify_password(password).await?;
        Ok(sensor)
    }

    /// Set the module address
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    /// Set how long to wait for each acknowledgement
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub async fn verify_password(&mut self, password: u32) -> Result<()> {
        let ack = self.transact(Instruction::VerifyPassword(password)).await?;
        if !ack.code.is_ok() {
            return Err(HardwareError::HandshakeRejected { code: ack.code });
        }
        debug!(address = self.address, "sensor handshake ok");
        Ok(())
    }

    /// Number of templates the module reports as stored.
    pub async fn template_count(&mut self) -> Result<u16> {
        let ack = self.transact(Instruction::TemplateCount).await?;
        if !ack.code.is_ok() {
            return Err(HardwareError::communication(format!(
                "template count failed: {}",
                ack.code
            )));
        }
        ack.data_u16()
            .ok_or_else(|| HardwareError::communication("template count reply too short"))
    }

    /// Send one instruction and wait for its acknowledgement.
    pub async fn transact(&mut self, instruction: Instruction) -> Result<Acknowledgement> {
        self.discard_stale_input().await;
        self.framed.send(instruction.to_packet(self.address)).await?;

        let reply = match tokio::time::timeout(self.ack_timeout, self.framed.next()).await {
            Ok(reply) => reply,
            Err(_) => {
                self.late_ack_pending = true;
                return Err(HardwareError::timeout(self.ack_timeout.as_millis() as u64));
            }
        };

        let packet = match reply {
            Some(packet) => packet?,
            None => return Err(HardwareError::disconnected("fingerprint sensor")),
        };

        if packet.kind != PacketKind::Acknowledge {
            return Err(HardwareError::communication(format!(
                "expected acknowledgement to {}, got {:?}",
                instruction, packet.kind
            )));
        }

        Ok(Acknowledgement::try_from(packet)?)
    }

    /// Drop input that belongs to an earlier transaction.
    ///
    /// After a timeout this waits up to one more `ack_timeout` for the late
    /// acknowledgement. Everything already readable is then decoded and
    /// thrown away without blocking.
    async fn discard_stale_input(&mut self) {
        if std::mem::take(&mut self.late_ack_pending) {
            if let Ok(Some(item)) = tokio::time::timeout(self.ack_timeout, self.framed.next()).await {
                log_discarded(item);
            }
        }

        // A decode error makes the stream yield one `None` before it reads
        // again. A second `None` in a row is end of stream.
        let mut ends = 0;
        while let Some(item) = self.framed.next().now_or_never() {
            match item {
                Some(item) => {
                    ends = 0;
                    log_discarded(item);
                }
                None => {
                    ends += 1;
                    if ends > 1 {
                        break;
                    }
                }
            }
        }
        self.framed.read_buffer_mut().clear();
    }

    /// Run an instruction and collapse transport failures into a code.
    async fn execute(&mut self, instruction: Instruction) -> SensorCode {
        match self.transact(instruction).await {
            Ok(ack) => ack.code,
            Err(HardwareError::Timeout { duration_ms }) => {
                warn!(%instruction, duration_ms, "sensor did not acknowledge");
                SensorCode::TIMEOUT
            }
            Err(e) => {
                warn!(%instruction, error = %e, "sensor transaction failed");
                SensorCode::PACKET_RECEIVE_ERROR
            }
        }
    }

    async fn execute_ok(&mut self, instruction: Instruction) -> SensorResult {
        match self.execute(instruction).await {
            SensorCode::OK => Ok(()),
            code => Err(code),
        }
    }
}

fn log_discarded(item: std::result::Result<Packet, fingate_core::Error>) {
    match item {
        Ok(packet) => debug!(kind = ?packet.kind, "discarded stale packet"),
        Err(e) => debug!(error = %e, "discarded stale input"),
    }
}

impl<T> FingerprintSensor for SerialSensor<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn capture_image(&mut self) -> CaptureOutcome {
        self.execute(Instruction::CaptureImage).await.into()
    }

    async fn convert_image(&mut self, buffer: FeatureBuffer) -> SensorResult {
        self.execute_ok(Instruction::ConvertImage(buffer)).await
    }

    async fn build_model(&mut self) -> std::result::Result<(), BuildError> {
        self.execute_ok(Instruction::BuildModel)
            .await
            .map_err(BuildError::from)
    }

    async fn store_model(&mut self, slot: SlotId) -> SensorResult {
        self.execute_ok(Instruction::StoreModel {
            buffer: FeatureBuffer::One,
            slot,
        })
        .await
    }

    async fn load_model(&mut self, slot: SlotId) -> SensorResult {
        self.execute_ok(Instruction::LoadModel {
            buffer: FeatureBuffer::One,
            slot,
        })
        .await
    }
}
