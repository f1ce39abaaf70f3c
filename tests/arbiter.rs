mod common;

mod tests {
    use proximity_trigger::{AnimationId, ControlIntent, Duration, Instant, TickOutcome, TrackRef};

    use crate::common::{FakeAudio, ScriptedRangeFinder, arbiter, round_robin_config};

    const POLL: Duration = Duration::from_millis(100);

    #[test]
    fn test_confirmed_trigger_activates_light_and_arms_cooldown() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(20.0),
            FakeAudio::plays_immediately(),
        );

        let outcome = arbiter.tick();
        let TickOutcome::Triggered { index, cooldown } = outcome else {
            panic!("expected trigger, got {outcome:?}");
        };
        assert_eq!(index, 0);

        let effect = *arbiter.catalog().get(0).unwrap();
        assert_eq!(
            arbiter.light().activations,
            vec![(AnimationId::PurpleFade, effect.params)]
        );
        assert_eq!(arbiter.audio().starts, vec![TrackRef(1)]);
        assert_eq!(arbiter.selector().next_index(), 1);

        let armed_at = arbiter.clock().now;
        let ready_at = arbiter.gate().cooldown.ready_at();
        assert!(ready_at >= armed_at + config.cooldown_min);
        assert!(ready_at <= armed_at + config.cooldown_max);
        assert_eq!(ready_at, armed_at + cooldown);
        assert!(arbiter.gate().busy.is_busy());
        assert_eq!(arbiter.stats().triggers, 1);
        assert_eq!(arbiter.last_effect().map(|e| e.label), Some("Creepy Laugh"));
    }

    #[test]
    fn test_failed_attempt_leaves_state_untouched_and_retries_same_effect() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(20.0),
            FakeAudio::never_plays(),
        );
        let ready_before = arbiter.gate().cooldown.ready_at();

        assert_eq!(arbiter.tick(), TickOutcome::Failed { index: 0 });
        assert!(arbiter.light().activations.is_empty());
        assert_eq!(arbiter.selector().next_index(), 0);
        assert_eq!(arbiter.gate().cooldown.ready_at(), ready_before);
        assert!(!arbiter.gate().busy.is_busy());
        assert_eq!(arbiter.audio().starts.len(), 2);

        arbiter.clock_mut().advance(POLL);
        assert_eq!(arbiter.tick(), TickOutcome::Failed { index: 0 });
        assert_eq!(arbiter.audio().starts, vec![TrackRef(1); 4]);
        assert_eq!(arbiter.stats().failed_attempts, 2);
    }

    #[test]
    fn test_cursor_survives_repeated_failures() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(15.0),
            FakeAudio::never_plays(),
        );

        for _ in 0..5 {
            arbiter.clock_mut().advance(POLL);
            assert!(matches!(arbiter.tick(), TickOutcome::Failed { index: 0 }));
        }
        assert_eq!(arbiter.selector().next_index(), 0);
    }

    #[test]
    fn test_round_robin_walks_catalog_after_each_success() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(20.0),
            FakeAudio::plays_immediately(),
        );

        let mut fired = Vec::new();
        for _ in 0..4 {
            match arbiter.tick() {
                TickOutcome::Triggered { index, .. } => fired.push(index),
                other => panic!("expected trigger, got {other:?}"),
            }
            // Let the track end and wait out any cooldown
            arbiter.audio_mut().finish();
            arbiter.clock_mut().advance(config.cooldown_max);
        }
        assert_eq!(fired, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_timeout_is_silent_and_mutates_nothing() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::silent(),
            FakeAudio::plays_immediately(),
        );
        let ready_before = arbiter.gate().cooldown.ready_at();

        for _ in 0..10 {
            assert_eq!(arbiter.tick(), TickOutcome::NoReading);
            arbiter.clock_mut().advance(POLL);
        }
        assert_eq!(arbiter.gate().cooldown.ready_at(), ready_before);
        assert!(!arbiter.gate().busy.is_busy());
        assert_eq!(arbiter.selector().next_index(), 0);
        assert!(arbiter.audio().starts.is_empty());
        assert_eq!(arbiter.stats().no_readings, 10);
    }

    #[test]
    fn test_target_during_cooldown_is_ignored() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(10.0),
            FakeAudio::plays_immediately(),
        );
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));

        // Track ends; the next status poll clears the busy gate
        arbiter.audio_mut().finish();
        arbiter.clock_mut().advance(config.status_poll_interval);

        let outcome = arbiter.tick();
        assert!(
            matches!(outcome, TickOutcome::CoolingDown { .. }),
            "got {outcome:?}"
        );
        assert_eq!(arbiter.audio().starts.len(), 1);
    }

    #[test]
    fn test_busy_audio_suppresses_sampling() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(10.0),
            FakeAudio::plays_immediately(),
        );
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));
        let pings = arbiter.sampler().finder().pings;

        for _ in 0..5 {
            arbiter.clock_mut().advance(POLL);
            assert_eq!(arbiter.tick(), TickOutcome::Busy);
        }
        assert_eq!(arbiter.sampler().finder().pings, pings);
    }

    #[test]
    fn test_busy_clears_only_on_status_poll() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(80.0),
            FakeAudio::plays_immediately(),
        );
        arbiter.apply(ControlIntent::ForceTrigger);
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));
        arbiter.audio_mut().finish();

        arbiter.clock_mut().advance(POLL);
        assert_eq!(arbiter.tick(), TickOutcome::Busy);

        arbiter.clock_mut().advance(config.status_poll_interval);
        assert!(matches!(arbiter.tick(), TickOutcome::OutOfRange { .. }));
    }

    #[test]
    fn test_out_of_range_target() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(45.0),
            FakeAudio::plays_immediately(),
        );
        let outcome = arbiter.tick();
        let TickOutcome::OutOfRange { distance_cm } = outcome else {
            panic!("expected out of range, got {outcome:?}");
        };
        assert!((distance_cm - 45.0).abs() < 0.1);
        assert!(arbiter.audio().starts.is_empty());
    }

    #[test]
    fn test_ticks_inside_poll_interval_are_suppressed() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(45.0),
            FakeAudio::plays_immediately(),
        );
        assert!(matches!(arbiter.tick(), TickOutcome::OutOfRange { .. }));
        arbiter.clock_mut().advance(Duration::from_millis(40));
        assert_eq!(arbiter.tick(), TickOutcome::Suppressed);
        arbiter.clock_mut().advance(Duration::from_millis(60));
        assert!(matches!(arbiter.tick(), TickOutcome::OutOfRange { .. }));
        assert_eq!(arbiter.sampler().finder().pings, 2);
    }

    #[test]
    fn test_threshold_change_applies_on_next_evaluation() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(40.0),
            FakeAudio::plays_immediately(),
        );
        assert!(matches!(arbiter.tick(), TickOutcome::OutOfRange { .. }));

        arbiter.set_detection_threshold(50.0);
        arbiter.clock_mut().advance(POLL);
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { index: 0, .. }));
    }

    #[test]
    fn test_invalid_threshold_is_ignored() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(40.0),
            FakeAudio::plays_immediately(),
        );
        arbiter.set_detection_threshold(f32::NAN);
        arbiter.set_detection_threshold(-3.0);
        assert_eq!(arbiter.detection_threshold(), 30.0);
    }

    #[test]
    fn test_disarmed_controller_never_samples() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::constant(5.0),
            FakeAudio::plays_immediately(),
        );
        arbiter.apply(ControlIntent::SetArmed(false));
        for _ in 0..3 {
            assert_eq!(arbiter.tick(), TickOutcome::Disarmed);
            arbiter.clock_mut().advance(POLL);
        }
        assert_eq!(arbiter.sampler().finder().pings, 0);

        arbiter.apply(ControlIntent::SetArmed(true));
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));
    }

    #[test]
    fn test_forced_trigger_bypasses_distance_but_not_busy() {
        let mut arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::silent(),
            FakeAudio::plays_immediately(),
        );
        arbiter.apply(ControlIntent::ForceTrigger);
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { index: 0, .. }));
        assert_eq!(arbiter.sampler().finder().pings, 0);

        arbiter.apply(ControlIntent::ForceTrigger);
        arbiter.clock_mut().advance(POLL);
        assert_eq!(arbiter.tick(), TickOutcome::Busy);
        assert!(arbiter.settings().force_pending);
    }

    #[test]
    fn test_forced_trigger_waits_for_cooldown() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::silent(),
            FakeAudio::plays_immediately(),
        );
        arbiter.apply(ControlIntent::ForceTrigger);
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));

        arbiter.audio_mut().finish();
        arbiter.clock_mut().advance(config.status_poll_interval);
        arbiter.apply(ControlIntent::ForceTrigger);
        let outcome = arbiter.tick();
        assert!(
            matches!(outcome, TickOutcome::CoolingDown { distance_cm: None, .. }),
            "forced trigger fired inside the cooldown: {outcome:?}"
        );
        assert_eq!(arbiter.audio().starts.len(), 1);
        assert!(arbiter.settings().force_pending);
        assert_eq!(arbiter.sampler().finder().pings, 0);

        arbiter.clock_mut().advance(config.cooldown_max);
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { index: 1, .. }));
        assert_eq!(arbiter.audio().starts.len(), 2);
        assert!(!arbiter.settings().force_pending);
    }

    #[test]
    fn test_proximity_trigger_blocked_until_cooldown_opens() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(20.0),
            FakeAudio::plays_immediately(),
        );
        assert!(matches!(arbiter.tick(), TickOutcome::Triggered { .. }));
        arbiter.audio_mut().finish();
        arbiter.clock_mut().advance(config.status_poll_interval);

        let now = arbiter.clock().now;
        assert!(!arbiter.gate().permits(now));
        assert!(matches!(
            arbiter.tick(),
            TickOutcome::CoolingDown { distance_cm: Some(_), .. }
        ));
        assert_eq!(arbiter.audio().starts.len(), 1);
    }

    #[test]
    fn test_attempt_requires_all_gates() {
        let config = round_robin_config();
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(25.0),
            FakeAudio::plays_immediately(),
        );

        for i in 0..400 {
            let now = arbiter.clock().now;
            let was_playing = arbiter.audio().playing;
            let was_open = arbiter.gate().cooldown.is_open(now);
            if arbiter.tick().attempted() {
                assert!(was_open);
                assert!(!was_playing);
            }
            if i % 12 == 11 {
                arbiter.audio_mut().finish();
            }
            arbiter.clock_mut().advance(Duration::from_millis(250));
        }
        assert!(arbiter.stats().triggers > 1);
    }

    #[test]
    fn test_uniform_random_policy_stays_in_catalog() {
        let config = proximity_trigger::TriggerConfig {
            rng_seed: 42,
            ..proximity_trigger::TriggerConfig::default()
        };
        let mut arbiter = arbiter(
            &config,
            ScriptedRangeFinder::constant(20.0),
            FakeAudio::plays_immediately(),
        );
        for _ in 0..20 {
            match arbiter.tick() {
                TickOutcome::Triggered { index, .. } => assert!(index < 3),
                other => panic!("expected trigger, got {other:?}"),
            }
            arbiter.audio_mut().finish();
            arbiter.clock_mut().advance(config.cooldown_max);
        }
        assert_eq!(arbiter.selector().next_index(), 0);
    }

    #[test]
    fn test_startup_cooldown_is_open() {
        let arbiter = arbiter(
            &round_robin_config(),
            ScriptedRangeFinder::silent(),
            FakeAudio::never_plays(),
        );
        assert_eq!(arbiter.gate().cooldown.ready_at(), Instant::from_millis(0));
        assert!(arbiter.gate().permits(Instant::from_millis(0)));
    }
}
