//! Day Partitioner (spec §4, Global Timeline Builder prerequisite):
//! groups the run's events by day tag into independent [`DayPlan`]s,
//! each anchored at its own `t0 = min(event.start_time_min)`.
//!
//! A course's `FlowPair`s are global, but a pair whose two events fall on
//! different days can never produce a real encounter — the day
//! partitioner is the first place day tags are in scope, so it is also
//! where cross-day flow pairs are rejected (spec §8 scenario 6), rather
//! than carrying them forward for the flow engine to silently ignore.

use courseflow_core::{Course, CourseflowError, CourseflowResult, DayPlan, ParticipantSet};

/// Build one [`DayPlan`] per distinct day tag present in `participants`.
/// Fails fast if any `FlowPair` in `course` spans two different days.
pub fn build_day_plans(course: &Course, participants: &ParticipantSet) -> CourseflowResult<Vec<DayPlan>> {
    validate_flow_pairs_stay_within_day(course, participants)?;

    let mut plans = Vec::new();
    for day in participants.days() {
        let events: Vec<String> = participants
            .events_for_day(&day)
            .map(|e| e.name.clone())
            .collect();
        if events.is_empty() {
            continue;
        }

        let anchor_t0 = participants
            .events_for_day(&day)
            .map(|e| e.start_time_min)
            .fold(None, |acc, t| match acc {
                None => Some(t),
                Some(min) if t.value() < min.value() => Some(t),
                some => some,
            })
            .expect("events is non-empty, so anchor_t0 always resolves");

        let segment_ids: Vec<String> = course
            .segments_used_by(&events)
            .iter()
            .map(|s| s.seg_id.clone())
            .collect();

        plans.push(DayPlan {
            day,
            events,
            segment_ids,
            anchor_t0,
        });
    }

    plans.sort_by(|a, b| a.day.cmp(&b.day));
    Ok(plans)
}

fn validate_flow_pairs_stay_within_day(course: &Course, participants: &ParticipantSet) -> CourseflowResult<()> {
    for pair in course.flow_pairs() {
        let day_a = participants
            .event(&pair.event_a)
            .ok_or_else(|| {
                CourseflowError::Config(format!(
                    "flow pair on segment '{}' references unknown event '{}'",
                    pair.seg_id, pair.event_a
                ))
            })?
            .day
            .as_str();
        let day_b = participants
            .event(&pair.event_b)
            .ok_or_else(|| {
                CourseflowError::Config(format!(
                    "flow pair on segment '{}' references unknown event '{}'",
                    pair.seg_id, pair.event_b
                ))
            })?
            .day
            .as_str();
        if day_a != day_b {
            return Err(CourseflowError::Config(format!(
                "flow pair on segment '{}' spans different days: '{}' ({day_a}) vs '{}' ({day_b})",
                pair.seg_id, pair.event_a, pair.event_b
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseflow_core::{EventSpan, FlowType, Kilometers, Meters, Minutes, Participant, PaceMinPerKm, SchemaClass, Seconds, Segment};
    use std::collections::BTreeMap;

    fn segment(seg_id: &str, events: &[(&str, f64, f64)]) -> Segment {
        let mut spans = BTreeMap::new();
        for (event, from, to) in events {
            spans.insert(
                event.to_string(),
                EventSpan {
                    from_km: Kilometers(*from),
                    to_km: Kilometers(*to),
                },
            );
        }
        Segment {
            seg_id: seg_id.to_string(),
            label: seg_id.to_string(),
            width_m: Meters(4.0),
            schema_class: SchemaClass::OnCourseOpen,
            spans,
            geometry: vec![],
        }
    }

    fn event(name: &str, day: &str, start_min: f64) -> courseflow_core::Event {
        courseflow_core::Event {
            name: name.to_string(),
            day: day.to_string(),
            start_time_min: Minutes(start_min),
            duration_min: Minutes(180.0),
            runners_file: format!("{name}.csv"),
            gpx_file: None,
        }
    }

    fn participant(runner_id: &str, event: &str, day: &str) -> Participant {
        Participant {
            runner_id: runner_id.to_string(),
            event: event.to_string(),
            pace_min_per_km: PaceMinPerKm(5.0),
            start_offset_s: Seconds(0.0),
            day: day.to_string(),
        }
    }

    #[test]
    fn groups_events_by_day_with_min_start_anchor() {
        let segments = BTreeMap::from([
            ("A1".to_string(), segment("A1", &[("full", 0.0, 5.0), ("half", 0.0, 5.0)])),
        ]);
        let course = Course::new(segments, vec![]).unwrap();
        let participants = ParticipantSet::new(
            vec![event("full", "sun", 420.0), event("half", "sun", 450.0)],
            vec![participant("r1", "full", "sun"), participant("r2", "half", "sun")],
        )
        .unwrap();

        let plans = build_day_plans(&course, &participants).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].day, "sun");
        assert_eq!(plans[0].anchor_t0, Minutes(420.0));
        assert_eq!(plans[0].segment_ids, vec!["A1".to_string()]);
    }

    #[test]
    fn rejects_flow_pair_spanning_two_different_days() {
        let segments = BTreeMap::from([
            ("A1".to_string(), segment("A1", &[("full", 0.0, 5.0), ("sat5k", 0.0, 5.0)])),
        ]);
        let course = Course::new(
            segments,
            vec![courseflow_core::FlowPair {
                seg_id: "A1".to_string(),
                event_a: "full".to_string(),
                event_b: "sat5k".to_string(),
                from_km_a: Kilometers(0.0),
                to_km_a: Kilometers(5.0),
                from_km_b: Kilometers(0.0),
                to_km_b: Kilometers(5.0),
                flow_type: FlowType::Merge,
                notes: None,
            }],
        )
        .unwrap();
        let participants = ParticipantSet::new(
            vec![event("full", "sun", 420.0), event("sat5k", "sat", 420.0)],
            vec![participant("r1", "full", "sun"), participant("r2", "sat5k", "sat")],
        )
        .unwrap();

        let err = build_day_plans(&course, &participants).unwrap_err();
        assert!(matches!(err, CourseflowError::Config(_)));
    }
}
