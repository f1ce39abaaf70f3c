//! Trigger gates
//!
//! A new effect may start only when the cooldown has expired and the audio
//! module is not busy with the previous one.

use embassy_time::{Duration, Instant};
use rand::Rng;

use crate::playback::{AudioPlayer, PlaybackStatus};

/// Randomized cooldown after a confirmed effect
#[derive(Debug, Clone)]
pub struct CooldownGate {
    ready_at: Instant,
    min: Duration,
    max: Duration,
}

impl CooldownGate {
    /// Create a gate that is already open at `now`
    pub fn new(now: Instant, min: Duration, max: Duration) -> Self {
        Self {
            ready_at: now,
            min,
            max,
        }
    }

    pub fn is_open(&self, now: Instant) -> bool {
        now >= self.ready_at
    }

    /// Close the gate for a random delay in `min..=max`
    ///
    /// Returns the drawn delay.
    pub fn arm<G: Rng + ?Sized>(&mut self, now: Instant, rng: &mut G) -> Duration {
        let delay_ticks = rng.random_range(self.min.as_ticks()..=self.max.as_ticks());
        let delay = Duration::from_ticks(delay_ticks);
        self.ready_at = now.checked_add(delay).unwrap_or(Instant::MAX);
        delay
    }

    /// Time at which the next trigger is allowed
    pub fn ready_at(&self) -> Instant {
        self.ready_at
    }

    /// Time left until the gate opens, zero if already open
    pub fn remaining(&self, now: Instant) -> Duration {
        self.ready_at.saturating_duration_since(now)
    }
}

/// Tracks whether the audio module is still playing the last effect.
///
/// Status is polled on its own slow cadence so the serial link is not flooded
/// with queries. While busy, the arbiter neither samples nor triggers.
#[derive(Debug, Clone)]
pub struct BusyGate {
    busy: bool,
    poll_interval: Duration,
    next_poll_at: Instant,
}

impl BusyGate {
    pub fn new(now: Instant, poll_interval: Duration) -> Self {
        Self {
            busy: false,
            poll_interval,
            next_poll_at: now,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Mark the audio module as occupied before a playback attempt
    pub fn mark_busy(&mut self, now: Instant) {
        self.busy = true;
        self.next_poll_at = now + self.poll_interval;
    }

    /// When the next status query is due
    pub fn next_poll_at(&self) -> Instant {
        self.next_poll_at
    }

    /// Clear the flag after an attempt whose last status query saw no playback
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// Record a status observed outside of the periodic poll
    pub fn observe(&mut self, status: PlaybackStatus) {
        self.busy = status == PlaybackStatus::Playing;
    }

    /// Query the audio module if a poll is due.
    ///
    /// Returns the observed status, or `None` if no poll was due.
    pub fn refresh<A: AudioPlayer + ?Sized>(&mut self, now: Instant, audio: &mut A) -> Option<PlaybackStatus> {
        if now < self.next_poll_at {
            return None;
        }
        self.next_poll_at = now + self.poll_interval;

        let status = audio.query_status();
        let was_busy = self.busy;
        self.observe(status);
        if was_busy && !self.busy {
            debug!("Audio idle ({:?}), sampling resumed", status);
        }
        Some(status)
    }
}

/// Combined gate state consulted by the arbiter
#[derive(Debug, Clone)]
pub struct TriggerGate {
    pub cooldown: CooldownGate,
    pub busy: BusyGate,
}

impl TriggerGate {
    pub fn new(now: Instant, cooldown_min: Duration, cooldown_max: Duration, status_poll_interval: Duration) -> Self {
        Self {
            cooldown: CooldownGate::new(now, cooldown_min, cooldown_max),
            busy: BusyGate::new(now, status_poll_interval),
        }
    }

    /// Whether a new attempt may start at `now`
    pub fn permits(&self, now: Instant) -> bool {
        self.cooldown.is_open(now) && !self.busy.is_busy()
    }
}
