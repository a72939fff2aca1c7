// libs/scheduling-cell/src/services/conflict.rs
//
// Pure conflict policy: decides whether a candidate appointment may be
// committed given the existing appointments loaded for its professional and
// patient. No storage, no logging; persistence belongs to the caller.

use crate::models::{
    Appointment, AppointmentStatus, CandidateAppointment, ConflictCheck, ConflictReason,
};
use crate::services::timeslot::intervals_overlap;

/// Evaluate the three scheduling rules in fixed priority order. The first
/// violated rule wins; at most one rejection is reported.
///
/// 1. A patient cannot have two appointments in progress at once.
/// 2. A patient gets at most one non-inert appointment per day.
/// 3. A professional's non-inert appointments on a day must not overlap.
///
/// Inert appointments (cancelled, no-show) never trigger any rule, and the
/// candidate's own row (`exclude_id`) is ignored everywhere so updates do not
/// conflict with themselves. The caller validates input shape (`start < end`,
/// parseable date) before invoking this.
pub fn check_conflict(candidate: &CandidateAppointment, existing: &[Appointment]) -> ConflictCheck {
    let others: Vec<&Appointment> = existing
        .iter()
        .filter(|a| candidate.exclude_id != Some(a.id))
        .collect();

    if candidate.status == AppointmentStatus::InProgress
        && others.iter().any(|a| {
            a.patient_id == candidate.patient_id && a.status == AppointmentStatus::InProgress
        })
    {
        return ConflictCheck::Rejected(ConflictReason::PatientAlreadyInProgress);
    }

    if others.iter().any(|a| {
        a.patient_id == candidate.patient_id && a.date == candidate.date && !a.status.is_inert()
    }) {
        return ConflictCheck::Rejected(ConflictReason::PatientDailyLimit);
    }

    if others.iter().any(|a| {
        a.professional_id == candidate.professional_id
            && a.date == candidate.date
            && !a.status.is_inert()
            && intervals_overlap(
                candidate.start_time,
                candidate.end_time,
                a.start_time,
                a.end_time,
            )
    }) {
        return ConflictCheck::Rejected(ConflictReason::ProfessionalTimeOverlap);
    }

    ConflictCheck::Accepted
}
