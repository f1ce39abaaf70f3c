//! Controller configuration.
//!
//! Defaults mirror the values the prop shipped with.

use embassy_time::Duration;

use crate::error::ConfigError;
use crate::selector::SelectionPolicy;

/// Default trigger distance in centimeters.
pub const DEFAULT_DETECTION_THRESHOLD_CM: f32 = 30.0;

/// Default interval between two distance samples.
pub const DEFAULT_SENSOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Echo wait limit. 30 ms covers roughly 5 m of range.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_millis(30);

/// Shortest cooldown after a confirmed effect.
pub const DEFAULT_COOLDOWN_MIN: Duration = Duration::from_millis(5_000);

/// Longest cooldown after a confirmed effect.
pub const DEFAULT_COOLDOWN_MAX: Duration = Duration::from_millis(15_000);

/// Longest accepted cooldown ceiling
pub const MAX_COOLDOWN: Duration = Duration::from_secs(3_600);

/// Interval between two audio status queries.
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

/// Ambient temperature assumed for speed of sound compensation.
pub const DEFAULT_TEMPERATURE_C: f32 = 20.0;

/// Default interval between two link health checks.
pub const DEFAULT_LINK_CHECK_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default interval between two telemetry snapshots.
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_millis(10_000);

/// Waits used by the playback confirmation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationTimings {
    /// Wait between the first start command and the first status query
    pub settle: Duration,
    /// Wait between a failed status query and the retry start command
    pub retry_gap: Duration,
    /// Wait between the retry start command and the final status query
    pub retry_settle: Duration,
}

impl ConfirmationTimings {
    /// Longest time a single confirmation attempt can block
    pub fn worst_case(&self) -> Duration {
        self.settle + self.retry_gap + self.retry_settle
    }
}

impl Default for ConfirmationTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            retry_gap: Duration::from_millis(200),
            retry_settle: Duration::from_millis(300),
        }
    }
}

/// Configuration for the trigger arbiter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Maximum distance (cm) at which a target counts as present
    pub detection_threshold_cm: f32,
    /// Minimum time between two distance samples
    pub sensor_poll_interval: Duration,
    /// Echo wait limit passed to the range finder
    pub echo_timeout: Duration,
    /// Lower bound of the randomized cooldown (inclusive)
    pub cooldown_min: Duration,
    /// Upper bound of the randomized cooldown (inclusive)
    pub cooldown_max: Duration,
    /// How often the audio module is asked whether it is still playing
    pub status_poll_interval: Duration,
    pub confirmation: ConfirmationTimings,
    pub policy: SelectionPolicy,
    /// Seed for effect selection and cooldown draws
    pub rng_seed: u64,
    /// Air temperature used to derive the speed of sound
    pub temperature_c: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            detection_threshold_cm: DEFAULT_DETECTION_THRESHOLD_CM,
            sensor_poll_interval: DEFAULT_SENSOR_POLL_INTERVAL,
            echo_timeout: DEFAULT_ECHO_TIMEOUT,
            cooldown_min: DEFAULT_COOLDOWN_MIN,
            cooldown_max: DEFAULT_COOLDOWN_MAX,
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            confirmation: ConfirmationTimings::default(),
            policy: SelectionPolicy::UniformRandom,
            rng_seed: 0,
            temperature_c: DEFAULT_TEMPERATURE_C,
        }
    }
}

impl TriggerConfig {
    /// Check the configuration for values the arbiter cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.detection_threshold_cm)?;
        if self.cooldown_min > self.cooldown_max {
            return Err(ConfigError::InvertedCooldown {
                min_ms: self.cooldown_min.as_millis(),
                max_ms: self.cooldown_max.as_millis(),
            });
        }
        if self.cooldown_max > MAX_COOLDOWN {
            return Err(ConfigError::CooldownTooLong {
                max_ms: self.cooldown_max.as_millis(),
                limit_ms: MAX_COOLDOWN.as_millis(),
            });
        }
        if self.sensor_poll_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.status_poll_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroStatusPollInterval);
        }
        Ok(())
    }
}

/// Check a detection threshold before it is applied
pub fn validate_threshold(threshold_cm: f32) -> Result<(), ConfigError> {
    if threshold_cm.is_finite() && threshold_cm > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold(threshold_cm))
    }
}

/// Cadences of the enclosing driver loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub link_check_interval: Duration,
    pub telemetry_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            link_check_interval: DEFAULT_LINK_CHECK_INTERVAL,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
        }
    }
}
