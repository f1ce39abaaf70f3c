//! Trigger arbiter - the root of the controller
//!
//! One call to [`TriggerArbiter::tick`] runs a full pass of the state machine:
//!
//! ```text
//! Idle -> Sampling -> Evaluating -> Attempting -> LightAndCooldown -> Idle
//!                                              \-> RetryImmediate  -> Idle
//! ```
//!
//! Every exit path ends back in `Idle`; the returned [`TickOutcome`] tells the
//! caller which path was taken.

use embassy_time::Duration;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::catalog::{EffectCatalog, EffectDefinition};
use crate::clock::Clock;
use crate::config::TriggerConfig;
use crate::control::{ControlIntent, RuntimeSettings};
use crate::error::ConfigError;
use crate::gate::TriggerGate;
use crate::light::LightDriver;
use crate::playback::{AudioPlayer, PlaybackConfirmation, PlaybackOutcome};
use crate::sampler::{DistanceSampler, RangeFinder, SampleOutcome};
use crate::selector::EffectSelector;

/// Path taken by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Audio still playing the previous effect, sensor not sampled
    Busy,
    /// Triggering disabled from the control surface
    Disarmed,
    /// Too early for another distance sample
    Suppressed,
    /// Echo timed out
    NoReading,
    /// Target further away than the detection threshold
    OutOfRange { distance_cm: f32 },
    /// Target in range but the cooldown has not expired. `distance_cm` is
    /// `None` when a forced trigger is waiting on the cooldown.
    CoolingDown {
        distance_cm: Option<f32>,
        remaining: Duration,
    },
    /// Playback confirmed, light started and cooldown armed
    Triggered { index: usize, cooldown: Duration },
    /// Playback could not be confirmed; eligible for an immediate retry
    Failed { index: usize },
}

impl TickOutcome {
    /// Whether this tick ran a playback attempt
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Triggered { .. } | Self::Failed { .. })
    }
}

/// Counters kept for telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub triggers: u32,
    pub failed_attempts: u32,
    pub no_readings: u32,
}

/// Trigger arbiter
///
/// Owns the collaborators and all mutable controller state. It is driven from
/// a single loop; nothing here is shared with other tasks.
pub struct TriggerArbiter<R: RangeFinder, A: AudioPlayer, L: LightDriver, C: Clock> {
    // External collaborators
    sampler: DistanceSampler<R>,
    audio: A,
    light: L,
    clock: C,

    // Configuration
    catalog: EffectCatalog,
    confirmation: PlaybackConfirmation,

    // Internal state
    selector: EffectSelector,
    gate: TriggerGate,
    settings: RuntimeSettings,
    rng: SmallRng,
    stats: TriggerStats,
    last_effect: Option<usize>,
}

impl<R: RangeFinder, A: AudioPlayer, L: LightDriver, C: Clock> TriggerArbiter<R, A, L, C> {
    /// Create an arbiter in `Idle` with the cooldown already open
    pub fn new(
        catalog: EffectCatalog,
        config: &TriggerConfig,
        finder: R,
        audio: A,
        light: L,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let now = clock.now();
        Ok(Self {
            sampler: DistanceSampler::new(
                finder,
                config.sensor_poll_interval,
                config.echo_timeout,
                config.temperature_c,
            ),
            audio,
            light,
            clock,
            selector: EffectSelector::new(config.policy, catalog.len()),
            catalog,
            confirmation: PlaybackConfirmation::new(config.confirmation),
            gate: TriggerGate::new(
                now,
                config.cooldown_min,
                config.cooldown_max,
                config.status_poll_interval,
            ),
            settings: RuntimeSettings::new(config.detection_threshold_cm),
            rng: SmallRng::seed_from_u64(config.rng_seed),
            stats: TriggerStats::default(),
            last_effect: None,
        })
    }

    /// Run one pass of the state machine
    ///
    /// Blocks only while a playback attempt is being confirmed.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();

        self.gate.busy.refresh(now, &mut self.audio);
        if self.gate.busy.is_busy() {
            return TickOutcome::Busy;
        }

        if self.settings.force_pending {
            // Skips the distance check only; stays pending until the cooldown opens
            if !self.gate.permits(now) {
                return TickOutcome::CoolingDown {
                    distance_cm: None,
                    remaining: self.gate.cooldown.remaining(now),
                };
            }
            self.settings.force_pending = false;
            info!("Forced trigger");
            return self.attempt();
        }

        if !self.settings.armed {
            return TickOutcome::Disarmed;
        }

        // Sampling
        let distance_cm = match self.sampler.sample(now) {
            SampleOutcome::Suppressed => return TickOutcome::Suppressed,
            SampleOutcome::NoReading => {
                self.stats.no_readings = self.stats.no_readings.wrapping_add(1);
                debug!("No echo");
                return TickOutcome::NoReading;
            }
            SampleOutcome::Measured(distance_cm) => distance_cm,
        };

        // Evaluating
        if distance_cm > self.settings.detection_threshold_cm {
            return TickOutcome::OutOfRange { distance_cm };
        }
        if !self.gate.permits(now) {
            return TickOutcome::CoolingDown {
                distance_cm: Some(distance_cm),
                remaining: self.gate.cooldown.remaining(now),
            };
        }

        info!("Target detected at {}cm", distance_cm);
        self.attempt()
    }

    /// Attempting, followed by LightAndCooldown or RetryImmediate
    fn attempt(&mut self) -> TickOutcome {
        let index = self.selector.select(&mut self.rng);
        let Some(effect) = self.catalog.get(index).copied() else {
            return TickOutcome::Failed { index };
        };

        info!("Triggering effect: {}", effect.label);
        self.gate.busy.mark_busy(self.clock.now());
        let outcome = self
            .confirmation
            .attempt(&effect, &mut self.audio, &mut self.clock);

        match outcome {
            PlaybackOutcome::Confirmed => {
                self.light.activate(effect.light, effect.params);

                let now = self.clock.now();
                self.gate.busy.mark_busy(now);
                let cooldown = self.gate.cooldown.arm(now, &mut self.rng);
                self.selector.advance();

                self.stats.triggers = self.stats.triggers.wrapping_add(1);
                self.last_effect = Some(index);
                info!("Next trigger available in {}ms", cooldown.as_millis());
                TickOutcome::Triggered { index, cooldown }
            }
            PlaybackOutcome::Failed => {
                // The last status query saw no playback, so the channel is free
                self.gate.busy.release();
                self.stats.failed_attempts = self.stats.failed_attempts.wrapping_add(1);
                TickOutcome::Failed { index }
            }
        }
    }

    /// Apply a control intent immediately
    pub fn apply(&mut self, intent: ControlIntent) {
        self.settings.apply(intent);
    }

    pub fn set_detection_threshold(&mut self, threshold_cm: f32) {
        self.apply(ControlIntent::SetDetectionThreshold(threshold_cm));
    }

    pub fn detection_threshold(&self) -> f32 {
        self.settings.detection_threshold_cm
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut RuntimeSettings {
        &mut self.settings
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn selector(&self) -> &EffectSelector {
        &self.selector
    }

    pub fn gate(&self) -> &TriggerGate {
        &self.gate
    }

    pub fn stats(&self) -> TriggerStats {
        self.stats
    }

    /// Most recently confirmed effect
    pub fn last_effect(&self) -> Option<&EffectDefinition> {
        self.last_effect.and_then(|index| self.catalog.get(index))
    }

    pub fn sampler(&self) -> &DistanceSampler<R> {
        &self.sampler
    }

    pub fn range_finder_mut(&mut self) -> &mut R {
        self.sampler.finder_mut()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn light(&self) -> &L {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut L {
        &mut self.light
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
