//! Runtime control surface
//!
//! Remote dashboards and buttons push [`ControlIntent`]s into a
//! [`ControlChannel`]. The driver drains the channel at the start of each loop
//! iteration, so changes land on the next tick and never interrupt a playback
//! attempt in progress.

use crate::channel::{Channel, Receiver, Sender};
use crate::config::validate_threshold;

/// Request to change the controller's runtime settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlIntent {
    /// Set the detection distance in centimeters
    SetDetectionThreshold(f32),
    /// Arm or disarm triggering (maintenance switch)
    SetArmed(bool),
    /// Fire an effect on the next idle tick regardless of distance, once the
    /// cooldown has expired
    ForceTrigger,
}

pub const CONTROL_CHANNEL_SIZE: usize = 8;

/// Type alias for the control channel
pub type ControlChannel = Channel<ControlIntent, CONTROL_CHANNEL_SIZE>;

/// Type alias for control sender
pub type ControlSender<'a> = Sender<'a, ControlIntent, CONTROL_CHANNEL_SIZE>;

/// Type alias for control receiver
pub type ControlReceiver<'a> = Receiver<'a, ControlIntent, CONTROL_CHANNEL_SIZE>;

/// Settings that may change while the controller runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeSettings {
    pub detection_threshold_cm: f32,
    pub armed: bool,
    /// A forced trigger is waiting for the next idle tick
    pub force_pending: bool,
}

impl RuntimeSettings {
    pub const fn new(detection_threshold_cm: f32) -> Self {
        Self {
            detection_threshold_cm,
            armed: true,
            force_pending: false,
        }
    }

    /// Apply one intent. Invalid thresholds are ignored.
    pub fn apply(&mut self, intent: ControlIntent) {
        match intent {
            ControlIntent::SetDetectionThreshold(threshold_cm) => {
                if let Err(err) = validate_threshold(threshold_cm) {
                    warn!("Ignoring threshold change: {}", err);
                    return;
                }
                info!(
                    "Detection threshold {}cm -> {}cm",
                    self.detection_threshold_cm, threshold_cm
                );
                self.detection_threshold_cm = threshold_cm;
            }
            ControlIntent::SetArmed(armed) => {
                info!("Triggering {}", if armed { "armed" } else { "disarmed" });
                self.armed = armed;
            }
            ControlIntent::ForceTrigger => {
                self.force_pending = true;
            }
        }
    }
}

/// Drains a control channel into runtime settings
pub struct ControlProcessor<'a> {
    intents: ControlReceiver<'a>,
}

impl<'a> ControlProcessor<'a> {
    pub const fn new(intents: ControlReceiver<'a>) -> Self {
        Self { intents }
    }

    /// Apply all pending intents (non-blocking)
    ///
    /// Returns the number of intents applied.
    pub fn process_pending(&mut self, settings: &mut RuntimeSettings) -> usize {
        let mut applied = 0;
        for intent in self.intents.drain() {
            settings.apply(intent);
            applied += 1;
        }
        applied
    }
}
