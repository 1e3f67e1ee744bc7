//! Biometric workflows for the fingate control core.
//!
//! - [`SlotAllocator`]: lowest-free-ID template slot scanner
//! - [`EnrollmentWorkflow`]: two-capture enrollment into a free slot
//! - [`IdentificationTest`]: bounded finger detection test
//!
//! All three block their caller until done and sleep on Tokio time, so tests
//! run them with `#[tokio::test(start_paused = true)]`.

pub mod enrollment;
pub mod identification;
pub mod slots;

pub use enrollment::{EnrollmentError, EnrollmentSession, EnrollmentStage, EnrollmentWorkflow};
pub use identification::{IdentificationReport, IdentificationTest};
pub use slots::{SlotAllocator, SlotProbe};
