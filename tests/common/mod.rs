#![allow(dead_code)]

use std::collections::VecDeque;

use proximity_trigger::{
    AnimationId, AnimationParams, AudioError, AudioPlayer, Clock, Duration, EffectCatalog,
    Instant, LightDriver, PlaybackStatus, RangeFinder, SelectionPolicy, TrackRef,
    TriggerArbiter, TriggerConfig, sampler::speed_of_sound,
};

/// Range finder that replays scripted echoes, then repeats `fallback`
#[derive(Debug, Default)]
pub struct ScriptedRangeFinder {
    pub script: VecDeque<Option<Duration>>,
    pub fallback: Option<Duration>,
    pub pings: usize,
}

impl ScriptedRangeFinder {
    /// Always report a target at `distance_cm`
    pub fn constant(distance_cm: f32) -> Self {
        Self {
            fallback: Some(echo_for(distance_cm)),
            ..Self::default()
        }
    }

    /// Never get an echo back
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn set_distance(&mut self, distance_cm: f32) {
        self.fallback = Some(echo_for(distance_cm));
    }
}

impl RangeFinder for ScriptedRangeFinder {
    fn range_once(&mut self, _timeout: Duration) -> Option<Duration> {
        self.pings += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

/// Round-trip echo time for a target at `distance_cm` and 20 °C
pub fn echo_for(distance_cm: f32) -> Duration {
    let cm_per_us = speed_of_sound(20.0) * 100.0 / 1_000_000.0;
    Duration::from_micros((distance_cm * 2.0 / cm_per_us).round() as u64)
}

/// Audio module double.
///
/// Playback begins once more than `failures_before_play` start commands were
/// received; `None` means it never plays.
#[derive(Debug, Default)]
pub struct FakeAudio {
    pub starts: Vec<TrackRef>,
    pub queries: usize,
    pub failures_before_play: Option<usize>,
    pub playing: bool,
    pub start_error: Option<AudioError>,
}

impl FakeAudio {
    pub fn plays_immediately() -> Self {
        Self {
            failures_before_play: Some(0),
            ..Self::default()
        }
    }

    pub fn never_plays() -> Self {
        Self::default()
    }

    /// Track reached its end
    pub fn finish(&mut self) {
        self.playing = false;
    }
}

impl AudioPlayer for FakeAudio {
    fn start_track(&mut self, track: TrackRef) -> Result<(), AudioError> {
        self.starts.push(track);
        if let Some(failures) = self.failures_before_play {
            if self.starts.len() > failures {
                self.playing = true;
            }
        }
        match self.start_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn query_status(&mut self) -> PlaybackStatus {
        self.queries += 1;
        if self.playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Stopped
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingLight {
    pub activations: Vec<(AnimationId, AnimationParams)>,
}

impl LightDriver for RecordingLight {
    fn activate(&mut self, animation: AnimationId, params: AnimationParams) {
        self.activations.push((animation, params));
    }
}

/// Clock whose delays advance time instantly
#[derive(Debug)]
pub struct FakeClock {
    pub now: Instant,
    pub delays: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: Instant::from_millis(0),
            delays: Vec::new(),
        }
    }

    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    pub fn total_delay(&self) -> Duration {
        self.delays
            .iter()
            .fold(Duration::from_ticks(0), |acc, delay| acc + *delay)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
        self.now += duration;
    }
}

pub type TestArbiter = TriggerArbiter<ScriptedRangeFinder, FakeAudio, RecordingLight, FakeClock>;

pub fn round_robin_config() -> TriggerConfig {
    TriggerConfig {
        policy: SelectionPolicy::RoundRobin,
        rng_seed: 7,
        ..TriggerConfig::default()
    }
}

pub fn arbiter(config: &TriggerConfig, finder: ScriptedRangeFinder, audio: FakeAudio) -> TestArbiter {
    TriggerArbiter::new(
        EffectCatalog::default(),
        config,
        finder,
        audio,
        RecordingLight::default(),
        FakeClock::new(),
    )
    .expect("valid config")
}
