//! Playback confirmation protocol
//!
//! The audio module accepts commands over a slow serial link and gives no
//! acknowledgement, so a start command is verified by polling its status after
//! a settle delay. One retry is allowed per attempt.

use crate::catalog::{EffectDefinition, TrackRef};
use crate::clock::Clock;
use crate::config::ConfirmationTimings;
use crate::error::AudioError;

/// Status reported by the audio module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Stopped,
    /// No or garbled answer
    Unknown,
}

/// Abstract audio module
///
/// Only one command may be outstanding at a time. Starting a track while
/// another one is playing is not guaranteed to work.
pub trait AudioPlayer {
    /// Start playing `track`
    fn start_track(&mut self, track: TrackRef) -> Result<(), AudioError>;

    /// Ask whether a track is playing
    fn query_status(&mut self) -> PlaybackStatus;
}

/// Result of one confirmation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Confirmed,
    Failed,
}

/// Maximum start commands issued by one attempt.
pub const MAX_START_COMMANDS: usize = 2;

/// Start-verify-retry sequence
#[derive(Debug, Clone, Copy)]
pub struct PlaybackConfirmation {
    timings: ConfirmationTimings,
}

impl PlaybackConfirmation {
    pub const fn new(timings: ConfirmationTimings) -> Self {
        Self { timings }
    }

    /// Start `effect`'s track and check that it is actually playing.
    ///
    /// Blocks the caller for at most [`ConfirmationTimings::worst_case`].
    pub fn attempt<A, C>(&self, effect: &EffectDefinition, audio: &mut A, clock: &mut C) -> PlaybackOutcome
    where
        A: AudioPlayer + ?Sized,
        C: Clock + ?Sized,
    {
        start(audio, effect);
        clock.delay(self.timings.settle);
        if audio.query_status() == PlaybackStatus::Playing {
            return PlaybackOutcome::Confirmed;
        }

        debug!("{} not playing yet, retrying", effect.label);
        clock.delay(self.timings.retry_gap);
        start(audio, effect);
        clock.delay(self.timings.retry_settle);

        match audio.query_status() {
            PlaybackStatus::Playing => PlaybackOutcome::Confirmed,
            status => {
                warn!(
                    "Playback of {} (track {}) not confirmed, last status {:?}",
                    effect.label, effect.sound.0, status
                );
                PlaybackOutcome::Failed
            }
        }
    }
}

/// The status query that follows decides the outcome, so a transport error
/// is only logged here.
fn start<A: AudioPlayer + ?Sized>(audio: &mut A, effect: &EffectDefinition) {
    if let Err(err) = audio.start_track(effect.sound) {
        warn!("Failed to start track {}: {}", effect.sound.0, err);
    }
}
