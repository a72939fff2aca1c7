// libs/scheduling-cell/src/services/timeslot.rs
//
// Half-open interval arithmetic shared by the conflict checker and the
// availability calculator. All intervals are [start, end): back-to-back
// bookings never intersect.

use chrono::{Duration, NaiveTime};

/// Two half-open intervals [a1, a2) and [b1, b2) intersect iff
/// a1 < b2 AND b1 < a2. Strict on both sides.
pub fn intervals_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether instant `t` falls inside [start, end). An appointment occupies
/// every slot boundary from its start up to, but not including, its end.
pub fn interval_contains(start: NaiveTime, end: NaiveTime, t: NaiveTime) -> bool {
    start <= t && t < end
}

/// Generate every instant from `start` up to and including `end`, stepping
/// by `step_minutes`. Degenerate inputs (`start >= end`, non-positive step)
/// yield an empty grid rather than an error.
pub fn slot_grid(start: NaiveTime, end: NaiveTime, step_minutes: i64) -> Vec<NaiveTime> {
    if step_minutes <= 0 || start >= end {
        return Vec::new();
    }

    let step = Duration::minutes(step_minutes);
    let mut slots = Vec::new();
    let mut current = start;

    while current <= end {
        slots.push(current);
        match current.overflowing_add_signed(step) {
            // Stepping past midnight wraps; the grid never crosses a day.
            (next, 0) => current = next,
            _ => break,
        }
    }

    slots
}
