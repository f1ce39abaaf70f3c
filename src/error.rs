use thiserror::Error;

/// Invalid [`TriggerConfig`](crate::TriggerConfig) values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("Cooldown minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    InvertedCooldown { min_ms: u64, max_ms: u64 },
    #[error("Cooldown maximum {max_ms}ms exceeds the {limit_ms}ms limit")]
    CooldownTooLong { max_ms: u64, limit_ms: u64 },
    #[error("Detection threshold {0}cm must be a positive finite distance")]
    InvalidThreshold(f32),
    #[error("Sensor poll interval must be non-zero")]
    ZeroPollInterval,
    #[error("Status poll interval must be non-zero")]
    ZeroStatusPollInterval,
}

/// Errors raised while building an [`EffectCatalog`](crate::EffectCatalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Effect catalog must contain at least one effect")]
    Empty,
    #[error("Effect catalog holds at most {capacity} effects")]
    CapacityExceeded { capacity: usize },
}

/// Transport failures reported by an [`AudioPlayer`](crate::AudioPlayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Failed to write command to audio module")]
    Write,
    #[error("Audio module did not respond")]
    NoResponse,
    #[error("Audio module rejected track {0}")]
    TrackRejected(u16),
}
