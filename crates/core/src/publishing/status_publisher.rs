use crate::validation::status::ValidationStatus;

/// Sink for validation statuses. Each published status supersedes the
/// previous one; there is no history.
pub trait StatusPublisher {
    fn publish(&mut self, status: ValidationStatus);
}

/// Forwards every status to each inner publisher in order.
#[derive(Default)]
pub struct FanoutPublisher {
    sinks: Vec<Box<dyn StatusPublisher>>,
}

impl FanoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn StatusPublisher>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl StatusPublisher for FanoutPublisher {
    fn publish(&mut self, status: ValidationStatus) {
        if let Some((last, rest)) = self.sinks.split_last_mut() {
            for sink in rest {
                sink.publish(status.clone());
            }
            last.publish(status);
        }
    }
}
