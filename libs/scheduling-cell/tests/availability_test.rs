// libs/scheduling-cell/tests/availability_test.rs
//
// Slot-grid and subtraction tests for the availability calculator.

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::models::{Appointment, AppointmentStatus, SchedulingWindow};
use scheduling_cell::services::availability::available_slots;
use scheduling_cell::services::timeslot::slot_grid;

fn t(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

fn d(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn window(start: &str, end: &str, slot_minutes: i64) -> SchedulingWindow {
    SchedulingWindow {
        day_start: t(start),
        day_end: t(end),
        slot_minutes,
    }
}

fn booked(
    professional_id: Uuid,
    date: &str,
    start: &str,
    end: &str,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        professional_id,
        date: d(date),
        start_time: t(start),
        end_time: t(end),
        status,
        notes: None,
        treatment: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn empty_schedule_yields_the_full_inclusive_grid() {
    let slots = available_slots(
        Uuid::new_v4(),
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &[],
        None,
    );

    // 08:00 through 18:00 inclusive at 30-minute steps.
    assert_eq!(slots.len(), 21);
    assert_eq!(slots.first().copied(), Some(t("08:00")));
    assert_eq!(slots.last().copied(), Some(t("18:00")));
}

#[test]
fn one_hour_appointment_removes_exactly_its_covered_instants() {
    let professional = Uuid::new_v4();
    let appointments = vec![booked(
        professional,
        "2024-01-10",
        "09:00",
        "10:00",
        AppointmentStatus::Scheduled,
    )];

    let slots = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );

    assert!(!slots.contains(&t("09:00")));
    assert!(!slots.contains(&t("09:30")));
    // The end instant is half-open and stays bookable.
    assert!(slots.contains(&t("10:00")));
    assert_eq!(slots.len(), 19);
}

#[test]
fn slot_sized_appointment_removes_only_its_start_instant() {
    let professional = Uuid::new_v4();
    let appointments = vec![booked(
        professional,
        "2024-01-10",
        "09:00",
        "09:30",
        AppointmentStatus::Confirmed,
    )];

    let slots = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );

    assert!(!slots.contains(&t("09:00")));
    assert!(slots.contains(&t("09:30")));
    assert_eq!(slots.len(), 20);
}

#[test]
fn inert_appointments_block_nothing() {
    let professional = Uuid::new_v4();
    let appointments = vec![
        booked(
            professional,
            "2024-01-10",
            "09:00",
            "10:00",
            AppointmentStatus::Cancelled,
        ),
        booked(
            professional,
            "2024-01-10",
            "11:00",
            "12:00",
            AppointmentStatus::NoShow,
        ),
    ];

    let slots = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );

    assert_eq!(slots.len(), 21);
}

#[test]
fn other_professionals_and_other_dates_block_nothing() {
    let professional = Uuid::new_v4();
    let appointments = vec![
        booked(
            Uuid::new_v4(),
            "2024-01-10",
            "09:00",
            "10:00",
            AppointmentStatus::Scheduled,
        ),
        booked(
            professional,
            "2024-01-11",
            "09:00",
            "10:00",
            AppointmentStatus::Scheduled,
        ),
    ];

    let slots = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );

    assert_eq!(slots.len(), 21);
}

#[test]
fn excluding_the_edited_appointment_frees_its_slots() {
    let professional = Uuid::new_v4();
    let own = booked(
        professional,
        "2024-01-10",
        "09:00",
        "10:00",
        AppointmentStatus::Scheduled,
    );
    let own_id = own.id;
    let appointments = vec![own];

    let without_exclusion = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );
    let with_exclusion = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        Some(own_id),
    );

    assert!(!without_exclusion.contains(&t("09:00")));
    assert!(with_exclusion.contains(&t("09:00")));
    assert_eq!(with_exclusion.len(), 21);
}

#[test]
fn degenerate_windows_yield_empty_sequences() {
    let professional = Uuid::new_v4();
    let date = d("2024-01-10");

    let inverted = available_slots(professional, date, &window("18:00", "08:00", 30), &[], None);
    assert!(inverted.is_empty());

    let collapsed = available_slots(professional, date, &window("09:00", "09:00", 30), &[], None);
    assert!(collapsed.is_empty());

    let zero_step = available_slots(professional, date, &window("08:00", "18:00", 0), &[], None);
    assert!(zero_step.is_empty());

    let negative_step = available_slots(professional, date, &window("08:00", "18:00", -15), &[], None);
    assert!(negative_step.is_empty());
}

#[test]
fn recompute_is_idempotent_and_order_stable() {
    let professional = Uuid::new_v4();
    let appointments = vec![
        booked(
            professional,
            "2024-01-10",
            "09:00",
            "10:00",
            AppointmentStatus::Scheduled,
        ),
        booked(
            professional,
            "2024-01-10",
            "14:00",
            "15:30",
            AppointmentStatus::Confirmed,
        ),
    ];

    let first = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );
    let second = available_slots(
        professional,
        d("2024-01-10"),
        &SchedulingWindow::default(),
        &appointments,
        None,
    );

    assert_eq!(first, second);
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
}

#[test]
fn slot_grid_steps_and_bounds() {
    let grid = slot_grid(t("08:00"), t("09:00"), 15);
    assert_eq!(
        grid,
        vec![t("08:00"), t("08:15"), t("08:30"), t("08:45"), t("09:00")]
    );

    // A step that does not land exactly on the end stops short of it.
    let coarse = slot_grid(t("08:00"), t("08:50"), 20);
    assert_eq!(coarse, vec![t("08:00"), t("08:20"), t("08:40")]);
}
