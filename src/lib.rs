#![no_std]

#[macro_use]
mod log;

pub mod arbiter;
pub mod catalog;
pub mod channel;
pub mod clock;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod gate;
pub mod light;
pub mod playback;
pub mod sampler;
pub mod selector;

pub use arbiter::{TickOutcome, TriggerArbiter, TriggerStats};
pub use catalog::{AnimationId, EffectCatalog, EffectDefinition, TrackRef};
pub use clock::{Clock, SystemClock};
pub use config::{ConfirmationTimings, DriverConfig, TriggerConfig};
pub use control::{ControlChannel, ControlIntent, ControlReceiver, ControlSender};
pub use driver::{LinkMonitor, Periodic, PropDriver, StepResult, TelemetrySink, TelemetrySnapshot};
pub use error::{AudioError, CatalogError, ConfigError};
pub use gate::{BusyGate, CooldownGate, TriggerGate};
pub use light::{AnimationParams, LightDriver};
pub use playback::{AudioPlayer, PlaybackConfirmation, PlaybackOutcome, PlaybackStatus};
pub use sampler::{DistanceSampler, RangeFinder, SampleOutcome};
pub use selector::{EffectSelector, SelectionPolicy};

pub use smart_leds::RGB8 as Rgb;
pub use embassy_time::{Duration, Instant};
