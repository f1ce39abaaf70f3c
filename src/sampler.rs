//! Rate-limited distance sampling
//!
//! Wraps an ultrasonic range finder. The finder reports the echo round-trip
//! time; the sampler turns it into centimeters and keeps the sensor from being
//! pinged more often than the configured poll interval.

use embassy_time::{Duration, Instant};

/// Speed of sound in dry air at 0 °C, m/s.
const SPEED_OF_SOUND_AT_ZERO_C: f32 = 331.3;

const ZERO_CELSIUS_IN_KELVIN: f32 = 273.15;

/// Abstract ranging hardware
pub trait RangeFinder {
    /// Fire one ping and wait at most `timeout` for the echo.
    ///
    /// Returns the round-trip echo time, or `None` if nothing came back in time.
    fn range_once(&mut self, timeout: Duration) -> Option<Duration>;
}

/// Result of one [`DistanceSampler::sample`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Called before the poll interval elapsed; the sensor was not touched
    Suppressed,
    /// Echo timed out, nothing in range
    NoReading,
    /// Measured distance in centimeters
    Measured(f32),
}

/// Distance sampler
pub struct DistanceSampler<R: RangeFinder> {
    finder: R,
    poll_interval: Duration,
    echo_timeout: Duration,
    /// Centimeters travelled per microsecond of round trip, already halved
    cm_per_echo_us: f32,
    last_sample_at: Option<Instant>,
}

impl<R: RangeFinder> DistanceSampler<R> {
    pub fn new(finder: R, poll_interval: Duration, echo_timeout: Duration, temperature_c: f32) -> Self {
        Self {
            finder,
            poll_interval,
            echo_timeout,
            cm_per_echo_us: speed_of_sound(temperature_c) * 100.0 / 1_000_000.0 / 2.0,
            last_sample_at: None,
        }
    }

    /// Take a sample unless the previous one is too recent
    pub fn sample(&mut self, now: Instant) -> SampleOutcome {
        if let Some(last) = self.last_sample_at {
            if now.saturating_duration_since(last) < self.poll_interval {
                return SampleOutcome::Suppressed;
            }
        }
        self.last_sample_at = Some(now);

        match self.finder.range_once(self.echo_timeout) {
            Some(echo) if echo.as_ticks() > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let echo_us = echo.as_micros() as f32;
                SampleOutcome::Measured(echo_us * self.cm_per_echo_us)
            }
            // A zero-length pulse is what the sensor reports on timeout
            _ => SampleOutcome::NoReading,
        }
    }

    /// Time of the last non-suppressed sample
    pub fn last_sample_at(&self) -> Option<Instant> {
        self.last_sample_at
    }

    /// Earliest time the next sample will be taken
    pub fn next_sample_at(&self, now: Instant) -> Instant {
        self.last_sample_at
            .map_or(now, |last| (last + self.poll_interval).max(now))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn finder(&self) -> &R {
        &self.finder
    }

    pub fn finder_mut(&mut self) -> &mut R {
        &mut self.finder
    }
}

/// Speed of sound in m/s at the given air temperature
pub fn speed_of_sound(temperature_c: f32) -> f32 {
    SPEED_OF_SOUND_AT_ZERO_C * libm::sqrtf(1.0 + temperature_c / ZERO_CELSIUS_IN_KELVIN)
}
