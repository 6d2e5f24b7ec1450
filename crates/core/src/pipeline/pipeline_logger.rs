use std::collections::HashMap;
use std::time::Instant;

use crate::scheduling::frame_scheduler::TickOutcome;

/// Observer for the capture loop.
///
/// The scheduler reports every tick outcome plus per-stage timings and
/// per-frame metrics; implementations decide what to keep and print.
pub trait PipelineLogger: Send {
    /// Record how one presentation callback was handled.
    fn tick(&mut self, outcome: TickOutcome);

    /// Record how long a named stage took for one processed frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. face percentage, brightness).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn tick(&mut self, _outcome: TickOutcome) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Accumulates outcome counts, stage timings and metrics, and logs a
/// summary report when the run ends.
///
/// A progress line is logged every `report_every` processed frames.
pub struct StdoutPipelineLogger {
    report_every: usize,
    outcomes: HashMap<TickOutcome, usize>,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(report_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
            outcomes: HashMap::new(),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    pub fn count(&self, outcome: TickOutcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    fn total_ticks(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.outcomes.is_empty() && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let processed = self.count(TickOutcome::Processed);
        let mut lines = Vec::new();

        lines.push(format!(
            "Capture loop summary ({} ticks, {processed} processed, {:.1}s wall):",
            self.total_ticks(),
            elapsed_ms / 1000.0
        ));

        let skipped: Vec<String> = [
            TickOutcome::Throttled,
            TickOutcome::NotReady,
            TickOutcome::Failed,
            TickOutcome::Ignored,
        ]
        .iter()
        .filter(|o| self.count(**o) > 0)
        .map(|o| format!("{} {o}", self.count(*o)))
        .collect();
        if !skipped.is_empty() {
            lines.push(format!("  Skipped: {}", skipped.join(", ")));
        }

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        if processed > 0 && elapsed_ms > 0.0 {
            let fps = processed as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn tick(&mut self, outcome: TickOutcome) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        if outcome == TickOutcome::Processed {
            let processed = self.count(TickOutcome::Processed);
            if processed % self.report_every == 0 {
                log::info!("Processed {processed} frames ({} ticks)", self.total_ticks());
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
