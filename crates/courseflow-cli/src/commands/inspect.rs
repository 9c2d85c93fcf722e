//! `courseflow inspect` (spec §3): print `Course`/`ParticipantSet`
//! summary statistics. The read-only reporting counterpart to
//! `validate` — no engines run, no exit-code gating on issues.

use std::path::Path;

use anyhow::Context;

use super::load_request_context;

pub fn run(request_path: &Path) -> anyhow::Result<()> {
    let (request, _dir, course, participants, _diagnostics) = load_request_context(request_path)
        .with_context(|| format!("inspecting request '{}'", request_path.display()))?;

    println!("Course");
    println!("  segments   : {}", course.segment_count());
    println!("  flow pairs : {}", course.flow_pairs().len());
    for segment in course.segments() {
        println!(
            "    {:<8} {:<10} width={:.1}m events={}",
            segment.seg_id,
            format!("{:?}", segment.schema_class),
            segment.width_m.value(),
            segment.spans.len()
        );
    }

    println!("Events");
    for day in participants.days() {
        println!("  day '{day}':");
        for event in participants.events_for_day(&day) {
            println!(
                "    {:<12} start={:.0}min dur={:.0}min runners={}",
                event.name,
                event.start_time_min.value(),
                event.duration_min.value(),
                participants.participant_count(&event.name)
            );
        }
    }

    println!(
        "Total: {} runners across {} events, {} days",
        participants.total_participants(),
        request.events.len(),
        participants.days().len()
    );

    Ok(())
}
