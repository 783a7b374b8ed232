//! Property-based tests for engine invariants.
//!
//! Tests validate:
//! 1. Task ids are strictly increasing within a run and restart at 1
//! 2. MetricSet::set is last-write-wins and stringifies values
//! 3. A wrapped operation returns exactly what the original returns
//! 4. Reported duration equals the synthetic delay between start and outcome

use flipwatch::hook::{wrap, Operation};
use flipwatch::host::{Clock, ManualClock};
use flipwatch::instrument::{LevelTracker, MetricSet};
use flipwatch::model::error::{HostError, InstrumentError};
use flipwatch::model::LevelId;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

// ===== Property 1: Task Sequencing =====

proptest! {
    #[test]
    fn task_ids_increase_within_a_run(runs in prop::collection::vec(0u32..20, 1..6)) {
        let clock = ManualClock::default();
        let mut tracker = LevelTracker::new();

        for (level, tasks) in runs.iter().enumerate() {
            tracker.start(LevelId::campaign(level as u32), clock.now());
            for expected in 1..=*tasks {
                clock.advance_ms(10);
                let slot = tracker.record_task(clock.now()).expect("level is running");
                prop_assert_eq!(slot.task_id.sequence(), expected);
                prop_assert_eq!(slot.time_taken_ms, 10);
            }
        }
    }

    #[test]
    fn duration_equals_synthetic_delay(delay in 0i64..10_000_000) {
        let clock = ManualClock::default();
        let mut tracker = LevelTracker::new();

        tracker.start(LevelId::reflex(), clock.now());
        clock.advance_ms(delay);
        let outcome = tracker.end(true, 0, clock.now()).expect("level is running");

        prop_assert_eq!(outcome.duration_ms, delay as u64);
        prop_assert!(!tracker.is_running());
    }
}

// ===== Property 2: Metric Overwrite =====

proptest! {
    #[test]
    fn metrics_are_last_write_wins(
        writes in prop::collection::vec(("[a-d]", any::<i64>()), 0..40)
    ) {
        let mut metrics = MetricSet::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for (key, value) in &writes {
            metrics.set(key.clone(), value);
            model.insert(key.clone(), value.to_string());
        }

        prop_assert_eq!(metrics.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(metrics.get(key), Some(value.as_str()));
        }
    }
}

// ===== Property 3: Behavior Preservation =====

fn doubling() -> Operation<i64> {
    Box::new(|total: &mut i64, args: &[Value]| {
        let n = args
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| HostError::Failed {
                operation: "double".to_string(),
                reason: "not a number".to_string(),
            })?;
        *total += n;
        Ok(json!(n.wrapping_mul(2)))
    })
}

proptest! {
    #[test]
    fn wrapper_returns_original_result(
        inputs in prop::collection::vec(prop_oneof![
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,4}".prop_map(|s| json!(s)),
        ], 1..20),
        fail_every in 1usize..4,
    ) {
        let mut plain = doubling();
        let mut calls = 0usize;
        let mut wrapped = wrap("double", doubling(), move |_total: &i64, _args: &[Value]| {
            calls += 1;
            if calls % fail_every == 0 {
                Err(InstrumentError::MalformedArgument { operation: "double", index: 0 })
            } else {
                Ok(())
            }
        });
        let (mut plain_total, mut wrapped_total) = (0i64, 0i64);

        for input in &inputs {
            let args = std::slice::from_ref(input);
            let expected = plain(&mut plain_total, args);
            let actual = wrapped(&mut wrapped_total, args);
            prop_assert_eq!(actual, expected);
        }
        prop_assert_eq!(wrapped_total, plain_total);
    }
}
