// libs/scheduling-cell/src/services/availability.rs

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Appointment, SchedulingWindow};
use crate::services::timeslot::{interval_contains, slot_grid};

/// Compute the bookable start instants for a professional on a date.
///
/// The grid runs from `window.day_start` to `window.day_end` inclusive,
/// stepping `window.slot_minutes`; an instant is dropped when a non-inert
/// appointment of this professional on this date covers it (half-open, so an
/// appointment's end instant stays free). `exclude_id` frees the slots of the
/// appointment currently being edited.
///
/// Only the start instant is guaranteed free: a caller picking a duration
/// that bridges into a booked region still gets rejected by the conflict
/// check at submission.
pub fn available_slots(
    professional_id: Uuid,
    date: NaiveDate,
    window: &SchedulingWindow,
    appointments: &[Appointment],
    exclude_id: Option<Uuid>,
) -> Vec<NaiveTime> {
    let grid = slot_grid(window.day_start, window.day_end, window.slot_minutes);
    if grid.is_empty() {
        return grid;
    }

    let blocking: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| {
            a.professional_id == professional_id
                && a.date == date
                && exclude_id != Some(a.id)
                && !a.status.is_inert()
        })
        .collect();

    grid.into_iter()
        .filter(|t| {
            !blocking
                .iter()
                .any(|a| interval_contains(a.start_time, a.end_time, *t))
        })
        .collect()
}
