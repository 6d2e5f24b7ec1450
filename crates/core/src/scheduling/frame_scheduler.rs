use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_adapter::{DetectionAdapter, InitializationError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::publishing::status_publisher::StatusPublisher;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::scheduling::frame_source::FrameSource;
use crate::scheduling::tick_host::{TickHandle, TickHost};
use crate::shared::constants::MIN_FRAME_INTERVAL_MS;
use crate::validation::evaluator::evaluate;
use crate::validation::policy::ValidationPolicy;
use crate::validation::status::ValidationStatus;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub min_frame_interval_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: MIN_FRAME_INTERVAL_MS,
        }
    }
}

/// How a single presentation callback was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// Fired after `stop`, or before any `start`.
    Ignored,
    NotReady,
    Throttled,
    Processed,
    /// A stage before publishing failed; nothing was published.
    Failed,
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TickOutcome::Ignored => "ignored",
            TickOutcome::NotReady => "not ready",
            TickOutcome::Throttled => "throttled",
            TickOutcome::Processed => "processed",
            TickOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Minimum-interval gate between processed ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThrottleState {
    last_processed_ms: Option<f64>,
}

impl ThrottleState {
    pub fn admits(&self, now_ms: f64, min_interval_ms: f64) -> bool {
        match self.last_processed_ms {
            Some(last) => now_ms - last >= min_interval_ms,
            None => true,
        }
    }

    pub fn record(&mut self, now_ms: f64) {
        self.last_processed_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.last_processed_ms = None;
    }

    pub fn last_processed_ms(&self) -> Option<f64> {
        self.last_processed_ms
    }
}

/// Resources owned while the loop is running.
struct Session {
    source: Box<dyn FrameSource>,
    surface: Box<dyn RenderSurface>,
    pending: Option<TickHandle>,
}

/// Drives per-frame detection, validation and overlay drawing off the
/// host's presentation callbacks.
///
/// Single-threaded: each tick runs to completion inside
/// [`FrameScheduler::on_tick`]. A scheduler built from a failed engine
/// publishes the unavailable status and never runs.
pub struct FrameScheduler {
    engine: Option<Box<dyn DetectionAdapter>>,
    policy: ValidationPolicy,
    config: SchedulerConfig,
    host: Box<dyn TickHost>,
    publisher: Box<dyn StatusPublisher>,
    logger: Box<dyn PipelineLogger>,
    renderer: OverlayRenderer,
    throttle: ThrottleState,
    session: Option<Session>,
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl FrameScheduler {
    pub fn new(
        engine: Result<Box<dyn DetectionAdapter>, InitializationError>,
        policy: ValidationPolicy,
        config: SchedulerConfig,
        host: Box<dyn TickHost>,
        mut publisher: Box<dyn StatusPublisher>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let engine = match engine {
            Ok(engine) => Some(engine),
            Err(e) => {
                log::error!("Face detection unavailable: {e}");
                publisher.publish(ValidationStatus::unavailable());
                None
            }
        };
        Self {
            engine,
            policy,
            config,
            host,
            publisher,
            logger,
            renderer: OverlayRenderer::default(),
            throttle: ThrottleState::default(),
            session: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn throttle(&self) -> ThrottleState {
        self.throttle
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        &*self.logger
    }

    /// Idle → Running. No-op while already running; an unavailable
    /// scheduler republishes its status and stays idle.
    pub fn start(&mut self, source: Box<dyn FrameSource>, surface: Box<dyn RenderSurface>) {
        if self.engine.is_none() {
            log::warn!("Ignoring start: face detection is unavailable");
            self.publisher.publish(ValidationStatus::unavailable());
            return;
        }
        if self.session.is_some() {
            log::debug!("Ignoring start: capture loop already running");
            return;
        }
        let pending = Some(self.host.request_next_tick());
        self.session = Some(Session {
            source,
            surface,
            pending,
        });
        log::info!("Capture loop started");
    }

    /// Running → Idle. Cancels the pending callback and resets the throttle
    /// so the next `start` processes its first tick immediately. Hands the
    /// frame source and surface back to the caller.
    pub fn stop(&mut self) -> Option<(Box<dyn FrameSource>, Box<dyn RenderSurface>)> {
        let session = self.session.take()?;
        if let Some(handle) = session.pending {
            self.host.cancel(handle);
        }
        self.throttle.reset();
        log::info!("Capture loop stopped");
        Some((session.source, session.surface))
    }

    /// Entry point for a fired presentation callback.
    pub fn on_tick(&mut self, now_ms: f64) -> TickOutcome {
        let outcome = match self.session.take() {
            None => TickOutcome::Ignored,
            Some(mut session) => {
                session.pending = None;
                let outcome = self.advance(&mut session, now_ms);
                session.pending = Some(self.host.request_next_tick());
                self.session = Some(session);
                outcome
            }
        };
        self.logger.tick(outcome);
        outcome
    }

    fn advance(&mut self, session: &mut Session, now_ms: f64) -> TickOutcome {
        let (w, h) = session.source.dimensions();
        if !session.source.is_ready() || w == 0 || h == 0 {
            return TickOutcome::NotReady;
        }
        if !self
            .throttle
            .admits(now_ms, self.config.min_frame_interval_ms)
        {
            return TickOutcome::Throttled;
        }
        self.throttle.record(now_ms);

        match self.process(session, now_ms) {
            Ok(()) => TickOutcome::Processed,
            Err(e) => {
                log::warn!("Skipping frame at {now_ms:.1}ms: {e}");
                TickOutcome::Failed
            }
        }
    }

    /// Pull → draw frame → detect → evaluate → publish → draw overlay.
    fn process(&mut self, session: &mut Session, now_ms: f64) -> Result<(), Box<dyn std::error::Error>> {
        let engine = self
            .engine
            .as_mut()
            .ok_or("detection engine unavailable")?;
        let frame = session.source.current_frame(now_ms)?;

        let started = Instant::now();
        if let Err(e) = self.renderer.draw_frame(session.surface.as_mut(), &frame) {
            log::warn!("Failed to draw frame: {e}");
        }
        let mut render_ms = elapsed_ms(started);

        let started = Instant::now();
        let detections = engine.detect(&frame)?.into_resolved();
        self.logger.timing("detect", elapsed_ms(started));

        let started = Instant::now();
        let status = evaluate(&detections, &frame, &self.policy);
        self.logger.timing("analyze", elapsed_ms(started));
        if let Some(metrics) = status.metrics() {
            self.logger.metric("face_percentage", metrics.face_percentage);
            self.logger.metric("brightness", metrics.brightness);
        }
        log::debug!("Frame at {now_ms:.1}ms: {} {}", status.color, status.message);

        let verdict = status.color;
        let single_face = status.details.is_some();
        self.publisher.publish(status);

        let started = Instant::now();
        if let (true, [detection]) = (single_face, detections.as_slice()) {
            if let Err(e) = self
                .renderer
                .draw(session.surface.as_mut(), detection, verdict)
            {
                log::warn!("Failed to draw overlay: {e}");
            }
        }
        if let Err(e) = session.surface.present() {
            log::warn!("Failed to present surface: {e}");
        }
        render_ms += elapsed_ms(started);
        self.logger.timing("render", render_ms);

        Ok(())
    }
}
