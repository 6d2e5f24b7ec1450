use crossbeam_channel::{Receiver, Sender};

use crate::publishing::status_publisher::StatusPublisher;
use crate::validation::status::ValidationStatus;

/// Hands statuses to another thread over an unbounded channel.
///
/// A disconnected receiver is not an error for the capture loop; further
/// statuses are dropped.
pub struct ChannelStatusPublisher {
    tx: Sender<ValidationStatus>,
    disconnected: bool,
}

impl ChannelStatusPublisher {
    pub fn new(tx: Sender<ValidationStatus>) -> Self {
        Self {
            tx,
            disconnected: false,
        }
    }

    /// Publisher plus the receiving end of a fresh channel.
    pub fn unbounded() -> (Self, Receiver<ValidationStatus>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl StatusPublisher for ChannelStatusPublisher {
    fn publish(&mut self, status: ValidationStatus) {
        if self.disconnected {
            return;
        }
        if self.tx.send(status).is_err() {
            log::warn!("Status receiver disconnected; dropping further statuses");
            self.disconnected = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_arrive_in_order() {
        let (mut publisher, rx) = ChannelStatusPublisher::unbounded();
        publisher.publish(ValidationStatus::initializing());
        publisher.publish(ValidationStatus::no_face());

        let received: Vec<_> = rx.try_iter().map(|s| s.message).collect();
        assert_eq!(
            received,
            vec!["Iniciando detección...", "No se detecta ningún rostro"]
        );
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (mut publisher, rx) = ChannelStatusPublisher::unbounded();
        drop(rx);
        publisher.publish(ValidationStatus::no_face());
        publisher.publish(ValidationStatus::no_face());
        assert!(publisher.disconnected);
    }

    #[test]
    fn test_receiver_on_other_thread() {
        let (mut publisher, rx) = ChannelStatusPublisher::unbounded();
        let handle = std::thread::spawn(move || rx.recv().unwrap().message);
        publisher.publish(ValidationStatus::unavailable());
        assert_eq!(handle.join().unwrap(), "Error al inicializar detección facial");
    }
}
