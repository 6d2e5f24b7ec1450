use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::publishing::status_publisher::StatusPublisher;
use crate::validation::status::{ValidationStatus, Verdict};

/// A capture was requested while the latest status did not allow it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("capture rejected: {message}")]
pub struct CaptureRejected {
    pub color: Verdict,
    pub message: String,
}

/// Capture-button consumer of the status stream.
///
/// Cloning yields another handle onto the same latest status, so one clone
/// can be handed to the scheduler as its publisher while the UI keeps
/// another.
#[derive(Clone)]
pub struct CaptureGate {
    latest: Arc<Mutex<ValidationStatus>>,
}

impl CaptureGate {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(Mutex::new(ValidationStatus::initializing())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ValidationStatus> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> ValidationStatus {
        self.lock().clone()
    }

    pub fn can_capture(&self) -> bool {
        self.lock().is_valid
    }

    /// Guidance to show next to the capture button.
    pub fn guidance(&self) -> (Verdict, String) {
        let status = self.lock();
        (status.color, status.message.clone())
    }

    pub fn request_capture(&self) -> Result<(), CaptureRejected> {
        let status = self.lock();
        if status.is_valid {
            Ok(())
        } else {
            Err(CaptureRejected {
                color: status.color,
                message: status.message.clone(),
            })
        }
    }
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPublisher for CaptureGate {
    fn publish(&mut self, status: ValidationStatus) {
        *self.lock() = status;
    }
}
