//! Enclosing driver loop
//!
//! Runs the trigger arbiter together with the slower housekeeping jobs of the
//! prop (link health and telemetry) without threads or async. The caller
//! sleeps for the returned duration between steps.
//!
//! # Usage
//!
//! ```ignore
//! static CONTROLS: ControlChannel = ControlChannel::new();
//!
//! let mut driver = PropDriver::new(arbiter, CONTROLS.receiver(), wifi, mqtt, &DriverConfig::default());
//! loop {
//!     let result = driver.step();
//!     embassy_time::block_for(result.sleep_duration);
//! }
//! ```

use embassy_time::{Duration, Instant};

use crate::arbiter::{TickOutcome, TriggerArbiter, TriggerStats};
use crate::clock::Clock;
use crate::config::DriverConfig;
use crate::control::{ControlProcessor, ControlReceiver};
use crate::light::LightDriver;
use crate::playback::AudioPlayer;
use crate::sampler::RangeFinder;

/// Passive network link status
pub trait LinkMonitor {
    fn is_link_up(&mut self) -> bool;
}

/// Receiver of periodic status reports
pub trait TelemetrySink {
    fn publish(&mut self, snapshot: &TelemetrySnapshot);
}

/// Point-in-time controller status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub uptime: Duration,
    pub link_up: bool,
    pub armed: bool,
    pub busy: bool,
    pub cooldown_remaining: Duration,
    pub detection_threshold_cm: f32,
    pub stats: TriggerStats,
    /// Label of the most recently confirmed effect
    pub last_effect: Option<&'static str>,
}

/// Fixed-interval job timer.
///
/// Falls back to `now` after a long stall instead of firing a burst of
/// overdue runs.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    interval: Duration,
    next_due: Instant,
}

impl Periodic {
    /// Create a timer that is due immediately
    pub const fn new(now: Instant, interval: Duration) -> Self {
        Self {
            interval,
            next_due: now,
        }
    }

    /// Returns `true` and schedules the next run if the job is due
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        if now > self.next_due + self.interval {
            self.next_due = now;
        }
        self.next_due += self.interval;
        true
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}

/// Result of one driver step
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    /// What the arbiter did this step
    pub outcome: TickOutcome,
    /// The earliest time any job needs to run again
    pub next_deadline: Instant,
    /// How long to wait until `next_deadline` (zero if already due)
    pub sleep_duration: Duration,
}

/// Main loop of the prop
pub struct PropDriver<'a, R, A, L, C, K, T>
where
    R: RangeFinder,
    A: AudioPlayer,
    L: LightDriver,
    C: Clock,
    K: LinkMonitor,
    T: TelemetrySink,
{
    arbiter: TriggerArbiter<R, A, L, C>,
    controls: ControlProcessor<'a>,
    link: K,
    telemetry: T,

    link_check: Periodic,
    telemetry_timer: Periodic,
    link_up: bool,
    started_at: Instant,
}

impl<'a, R, A, L, C, K, T> PropDriver<'a, R, A, L, C, K, T>
where
    R: RangeFinder,
    A: AudioPlayer,
    L: LightDriver,
    C: Clock,
    K: LinkMonitor,
    T: TelemetrySink,
{
    pub fn new(
        arbiter: TriggerArbiter<R, A, L, C>,
        controls: ControlReceiver<'a>,
        link: K,
        telemetry: T,
        config: &DriverConfig,
    ) -> Self {
        let now = arbiter.clock().now();
        Self {
            arbiter,
            controls: ControlProcessor::new(controls),
            link,
            telemetry,
            link_check: Periodic::new(now, config.link_check_interval),
            telemetry_timer: Periodic::new(now, config.telemetry_interval),
            link_up: false,
            started_at: now,
        }
    }

    /// Run one loop iteration
    ///
    /// 1. Applies pending control intents
    /// 2. Ticks the arbiter (may block while playback is confirmed)
    /// 3. Runs the link check and telemetry jobs if they are due
    pub fn step(&mut self) -> StepResult {
        self.controls.process_pending(self.arbiter.settings_mut());
        let outcome = self.arbiter.tick();

        let now = self.arbiter.clock().now();
        if self.link_check.poll(now) {
            self.check_link();
        }
        if self.telemetry_timer.poll(now) {
            let snapshot = self.snapshot(now);
            self.telemetry.publish(&snapshot);
        }

        let next_deadline = self
            .next_tick_at(now)
            .min(self.link_check.next_due())
            .min(self.telemetry_timer.next_due());

        StepResult {
            outcome,
            next_deadline,
            sleep_duration: next_deadline.saturating_duration_since(now),
        }
    }

    /// Current controller status
    pub fn snapshot(&self, now: Instant) -> TelemetrySnapshot {
        let gate = self.arbiter.gate();
        let settings = self.arbiter.settings();
        TelemetrySnapshot {
            uptime: now.saturating_duration_since(self.started_at),
            link_up: self.link_up,
            armed: settings.armed,
            busy: gate.busy.is_busy(),
            cooldown_remaining: gate.cooldown.remaining(now),
            detection_threshold_cm: settings.detection_threshold_cm,
            stats: self.arbiter.stats(),
            last_effect: self.arbiter.last_effect().map(|effect| effect.label),
        }
    }

    pub fn arbiter(&self) -> &TriggerArbiter<R, A, L, C> {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut TriggerArbiter<R, A, L, C> {
        &mut self.arbiter
    }

    pub fn link(&self) -> &K {
        &self.link
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    fn check_link(&mut self) {
        let up = self.link.is_link_up();
        if up != self.link_up {
            if up {
                info!("Link up");
            } else {
                warn!("Link down");
            }
        }
        self.link_up = up;
    }

    /// When the arbiter has work again: the next status poll while busy,
    /// otherwise the next distance sample
    fn next_tick_at(&self, now: Instant) -> Instant {
        let gate = self.arbiter.gate();
        let sampler = self.arbiter.sampler();
        if gate.busy.is_busy() {
            gate.busy.next_poll_at().max(now)
        } else if self.arbiter.settings().armed {
            sampler.next_sample_at(now)
        } else {
            // Nothing to sample; just keep an eye on the control channel
            now + sampler.poll_interval()
        }
    }
}
