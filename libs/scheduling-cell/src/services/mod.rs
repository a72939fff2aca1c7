pub mod availability;
pub mod conflict;
pub mod scheduling;
pub mod timeslot;
