//! Property tests checking lookups against a plain `Vec` model.

use proptest::prelude::*;
use timeline::{NOT_FOUND, Timeline, TimelineConfig};

/// Stamps from a small alphabet so repeats are common.
fn stamps() -> impl Strategy<Value = Vec<(u8, u64)>> {
    prop::collection::vec((0u8..6, 0u64..1_000_000), 0..200)
}

fn model_time_between(model: &[(u8, u64)], from: u8, to: u8) -> i64 {
    let Some(start) = model.iter().position(|&(state, _)| state == from) else {
        return NOT_FOUND;
    };
    match model[start + 1..].iter().find(|&&(state, _)| state == to) {
        Some(&(_, end)) => i64::try_from(end.saturating_sub(model[start].1)).unwrap(),
        None => NOT_FOUND,
    }
}

fn build(model: &[(u8, u64)], capacity: usize) -> Timeline<u8> {
    let config = TimelineConfig::new(capacity).unwrap();
    let timeline = Timeline::with_config(&config, None).unwrap();
    for &(state, timestamp) in model {
        timeline.append_at(state, timestamp);
    }
    timeline
}

proptest! {
    #[test]
    fn events_match_model(model in stamps(), capacity in 1usize..16) {
        let timeline = build(&model, capacity);
        let events: Vec<(u8, u64)> = timeline
            .iter()
            .map(|event| (*event.state, event.timestamp))
            .collect();
        prop_assert_eq!(events, model);
    }

    #[test]
    fn find_by_state_matches_model(
        model in stamps(),
        capacity in 1usize..16,
        state in 0u8..7,
        from in 0usize..250,
    ) {
        let timeline = build(&model, capacity);
        let expected = model
            .iter()
            .enumerate()
            .skip(from)
            .find(|&(_, &(s, _))| s == state)
            .map(|(index, &(_, timestamp))| (index, timestamp));
        let actual = timeline
            .find_by_state(&state, from)
            .map(|event| (event.index, event.timestamp));
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn time_between_matches_model(
        model in stamps(),
        capacity in 1usize..16,
        from in 0u8..7,
        to in 0u8..7,
    ) {
        let timeline = build(&model, capacity);
        let actual = timeline.time_between_nanos(&from, &to);
        prop_assert_eq!(actual, model_time_between(&model, from, to));
        prop_assert!(actual >= NOT_FOUND);
    }

    #[test]
    fn capacity_covers_every_stamp(model in stamps(), capacity in 1usize..16) {
        let timeline = build(&model, capacity);
        let capacities = timeline.segment_capacities();
        prop_assert!(capacities.windows(2).all(|pair| pair[1] > pair[0]));
        prop_assert!(capacities.iter().sum::<usize>() >= timeline.len());
    }
}
