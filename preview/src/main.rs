//! Desktop simulator for the proximity trigger
//!
//! Runs the real driver loop against simulated collaborators: a range finder
//! fed from a slider, an audio module with a fixed track length and optional
//! failure injection, and a light strip showing the active animation.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant as StdInstant;

use eframe::egui::{self};
use proximity_trigger::{
    AnimationId, AnimationParams, AudioError, AudioPlayer, Clock, ControlChannel, ControlIntent,
    ControlSender, DriverConfig, Duration, EffectCatalog, Instant, LightDriver, LinkMonitor,
    PlaybackStatus, PropDriver, RangeFinder, Rgb, SelectionPolicy, TelemetrySink,
    TelemetrySnapshot, TickOutcome, TrackRef, TriggerArbiter, TriggerConfig,
    sampler::speed_of_sound,
};

/// Number of simulated LEDs
const LED_COUNT: usize = 48;

/// Size of each LED rectangle in pixels
const LED_SIZE: f32 = 12.0;

/// Gap between LEDs
const LED_GAP: f32 = 2.0;

/// Entries kept in the event log
const LOG_LINES: usize = 12;

/// Static control channel between the UI and the driver
static CONTROLS: ControlChannel = ControlChannel::new();

/// Simulated time in milliseconds, shared by all collaborators
type SimTime = Rc<Cell<u64>>;

struct SimClock {
    t_ms: SimTime,
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.t_ms.get())
    }

    fn delay(&mut self, duration: Duration) {
        self.t_ms.set(self.t_ms.get() + duration.as_millis());
    }
}

struct SimRangeFinder {
    distance_cm: f32,
    present: bool,
}

impl RangeFinder for SimRangeFinder {
    fn range_once(&mut self, timeout: Duration) -> Option<Duration> {
        if !self.present {
            return None;
        }
        let cm_per_us = speed_of_sound(proximity_trigger::config::DEFAULT_TEMPERATURE_C) * 1e-4;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let echo = Duration::from_micros((self.distance_cm * 2.0 / cm_per_us) as u64);
        (echo <= timeout).then_some(echo)
    }
}

struct SimAudio {
    t_ms: SimTime,
    track_length_ms: u64,
    playing_until: Option<u64>,
    /// Start commands ignored before one is honoured
    flaky_starts: u32,
    ignored: u32,
    last_track: Option<TrackRef>,
}

impl AudioPlayer for SimAudio {
    fn start_track(&mut self, track: TrackRef) -> Result<(), AudioError> {
        if self.ignored < self.flaky_starts {
            self.ignored += 1;
            return Ok(());
        }
        self.ignored = 0;
        self.last_track = Some(track);
        self.playing_until = Some(self.t_ms.get() + self.track_length_ms);
        Ok(())
    }

    fn query_status(&mut self) -> PlaybackStatus {
        match self.playing_until {
            Some(until) if self.t_ms.get() < until => PlaybackStatus::Playing,
            _ => PlaybackStatus::Stopped,
        }
    }
}

struct SimLight {
    t_ms: SimTime,
    active: Option<(AnimationId, AnimationParams, u64)>,
}

impl SimLight {
    /// Color of the strip right now: a linear fade over the animation length
    fn color(&self) -> Rgb {
        let Some((_, params, started_at)) = self.active else {
            return Rgb::default();
        };
        let elapsed = self.t_ms.get().saturating_sub(started_at);
        let total = params.duration.as_millis().max(1);
        if elapsed >= total {
            return Rgb::default();
        }
        let level = u64::from(params.brightness) * (total - elapsed) / total;
        #[allow(clippy::cast_possible_truncation)]
        let scale = |c: u8| (u64::from(c) * level / 255) as u8;
        Rgb::new(scale(params.color.r), scale(params.color.g), scale(params.color.b))
    }
}

impl LightDriver for SimLight {
    fn activate(&mut self, animation: AnimationId, params: AnimationParams) {
        self.active = Some((animation, params, self.t_ms.get()));
    }
}

struct SimLink {
    up: bool,
}

impl LinkMonitor for SimLink {
    fn is_link_up(&mut self) -> bool {
        self.up
    }
}

#[derive(Default)]
struct LastSnapshot {
    snapshot: Option<TelemetrySnapshot>,
}

impl TelemetrySink for LastSnapshot {
    fn publish(&mut self, snapshot: &TelemetrySnapshot) {
        self.snapshot = Some(*snapshot);
    }
}

type SimDriver = PropDriver<'static, SimRangeFinder, SimAudio, SimLight, SimClock, SimLink, LastSnapshot>;

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 520.0])
            .with_title("Proximity Trigger Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "proximity-trigger-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()?))),
    )
}

struct PreviewApp {
    driver: SimDriver,
    controls: ControlSender<'static>,
    t_ms: SimTime,
    next_step_ms: u64,
    last_frame: StdInstant,
    /// Time scale multiplier (1.0 = realtime)
    time_scale: f32,
    threshold_cm: f32,
    armed: bool,
    log: VecDeque<String>,
}

impl PreviewApp {
    fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let t_ms: SimTime = Rc::new(Cell::new(0));
        let config = TriggerConfig {
            policy: SelectionPolicy::RoundRobin,
            rng_seed: 0x5eed,
            ..TriggerConfig::default()
        };
        let arbiter = TriggerArbiter::new(
            EffectCatalog::default(),
            &config,
            SimRangeFinder {
                distance_cm: 120.0,
                present: true,
            },
            SimAudio {
                t_ms: t_ms.clone(),
                track_length_ms: 4_000,
                playing_until: None,
                flaky_starts: 0,
                ignored: 0,
                last_track: None,
            },
            SimLight {
                t_ms: t_ms.clone(),
                active: None,
            },
            SimClock { t_ms: t_ms.clone() },
        )?;
        let driver = PropDriver::new(
            arbiter,
            CONTROLS.receiver(),
            SimLink { up: true },
            LastSnapshot::default(),
            &DriverConfig::default(),
        );

        Ok(Self {
            driver,
            controls: CONTROLS.sender(),
            t_ms,
            next_step_ms: 0,
            last_frame: StdInstant::now(),
            time_scale: 1.0,
            threshold_cm: config.detection_threshold_cm,
            armed: true,
            log: VecDeque::new(),
        })
    }

    fn send(&mut self, intent: ControlIntent) {
        if self.controls.try_send(intent).is_err() {
            self.push_log("control queue full".to_owned());
        }
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(format!("{:>7.1}s  {line}", self.t_ms.get() as f64 / 1000.0));
    }

    /// Advance simulated time and run every driver step that became due
    fn update_time(&mut self) {
        let now = StdInstant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delta_ms = (delta.as_secs_f64() * 1000.0 * f64::from(self.time_scale)) as u64;
        let target = self.t_ms.get() + delta_ms;

        while self.next_step_ms <= target {
            self.t_ms.set(self.t_ms.get().max(self.next_step_ms));
            let result = self.driver.step();
            self.describe(result.outcome);
            self.next_step_ms = result.next_deadline.as_millis().max(self.t_ms.get() + 1);
        }
        self.t_ms.set(self.t_ms.get().max(target));
    }

    fn describe(&mut self, outcome: TickOutcome) {
        let line = match outcome {
            TickOutcome::Triggered { index, cooldown } => {
                let label = self
                    .driver
                    .arbiter()
                    .catalog()
                    .get(index)
                    .map_or("?", |effect| effect.label);
                format!("triggered {label}, cooldown {}ms", cooldown.as_millis())
            }
            TickOutcome::Failed { index } => format!("effect #{index} did not start"),
            TickOutcome::CoolingDown { remaining, .. } => {
                format!("in range, cooling down {}ms", remaining.as_millis())
            }
            _ => return,
        };
        self.push_log(line);
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_time();
        ctx.request_repaint();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // <Target>
                ui.vertical(|ui| {
                    let finder = self.driver.arbiter_mut().range_finder_mut();
                    ui.checkbox(&mut finder.present, "Target present");
                    ui.horizontal(|ui| {
                        ui.label("Distance (cm):");
                        ui.add(egui::Slider::new(&mut finder.distance_cm, 2.0..=400.0));
                    });

                    ui.add_space(4.0);

                    ui.horizontal(|ui| {
                        ui.label("Threshold (cm):");
                        let old_threshold = self.threshold_cm;
                        ui.add(egui::Slider::new(&mut self.threshold_cm, 5.0..=200.0));
                        if self.threshold_cm != old_threshold {
                            self.send(ControlIntent::SetDetectionThreshold(self.threshold_cm));
                        }
                    });

                    ui.horizontal(|ui| {
                        let old_armed = self.armed;
                        ui.checkbox(&mut self.armed, "Armed");
                        if self.armed != old_armed {
                            self.send(ControlIntent::SetArmed(self.armed));
                        }
                        if ui.button("Force trigger").clicked() {
                            self.send(ControlIntent::ForceTrigger);
                        }
                    });
                });
                // </Target>
                ui.add_space(16.0);
                // <Simulation>
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label("Speed:");
                        ui.add(egui::Slider::new(&mut self.time_scale, 0.1..=10.0).logarithmic(true));
                    });

                    let audio = self.driver.arbiter_mut().audio_mut();
                    ui.horizontal(|ui| {
                        ui.label("Track length (ms):");
                        ui.add(egui::DragValue::new(&mut audio.track_length_ms).range(500..=20_000));
                    });
                    ui.horizontal(|ui| {
                        ui.label("Ignored starts:");
                        ui.add(egui::DragValue::new(&mut audio.flaky_starts).range(0..=4));
                    });
                });
                // </Simulation>
            });

            ui.add_space(12.0);

            let now = Instant::from_millis(self.t_ms.get());
            let arbiter = self.driver.arbiter();
            let gate = arbiter.gate();
            ui.label(format!(
                "busy: {}   cooldown: {}ms   next round-robin: #{}",
                gate.busy.is_busy(),
                gate.cooldown.remaining(now).as_millis(),
                arbiter.selector().next_index(),
            ));
            if let Some(track) = arbiter.audio().last_track {
                ui.label(format!("last track: {}", track.0));
            }
            if let Some(snapshot) = self.driver.telemetry().snapshot {
                ui.label(format!(
                    "telemetry @ {}s: {} triggers, {} failed, {} misses, last {}",
                    snapshot.uptime.as_secs(),
                    snapshot.stats.triggers,
                    snapshot.stats.failed_attempts,
                    snapshot.stats.no_readings,
                    snapshot.last_effect.unwrap_or("-"),
                ));
            }

            ui.add_space(12.0);

            // === Light strip ===
            let pixel = self.driver.arbiter().light().color();
            let led_pitch = LED_SIZE + LED_GAP;
            #[allow(clippy::cast_precision_loss)]
            let (response, painter) = ui.allocate_painter(
                egui::vec2(LED_COUNT as f32 * led_pitch, LED_SIZE),
                egui::Sense::hover(),
            );
            let origin = response.rect.min;
            let color = egui::Color32::from_rgb(pixel.r, pixel.g, pixel.b);
            #[allow(clippy::cast_precision_loss)]
            for i in 0..LED_COUNT {
                let rect = egui::Rect::from_min_size(
                    egui::pos2(origin.x + i as f32 * led_pitch, origin.y),
                    egui::vec2(LED_SIZE, LED_SIZE),
                );
                painter.rect_filled(rect, 3.0, color);
            }
            if let Some((animation, ..)) = self.driver.arbiter().light().active {
                ui.label(format!("animation: {}", animation.as_str()));
            }

            ui.add_space(12.0);

            for line in &self.log {
                ui.monospace(line);
            }
        });
    }
}
