//! Interview-step / calendar-event linking rules.
//!
//! The link is a one-directional cached reference (external event id +
//! display summary) with no ownership of the provider-side event and no sync
//! guarantee. Nothing prevents the same event from being linked to several
//! steps, and a manually edited scheduled date may diverge from the event.

use chrono::{DateTime, Utc};

use crate::calendar::client::EventTime;

/// Category given to steps imported from a calendar event.
pub const IMPORTED_STEP_CATEGORY: &str = "other";
/// Status given to steps imported from a calendar event.
pub const IMPORTED_STEP_STATUS: &str = "upcoming";

/// Field values for a step created from a calendar event (import mode).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedStep {
    /// Next ordinal position within the process.
    pub position: i32,
    pub category: &'static str,
    pub status: &'static str,
    /// Seeded from the event summary.
    pub notes: String,
    pub scheduled_at: DateTime<Utc>,
    pub calendar_event_id: String,
    pub calendar_event_summary: String,
}

/// Computes the defaults for import mode given the number of steps the
/// process already has.
pub fn step_from_event(
    existing_steps: i64,
    event_id: &str,
    summary: &str,
    start: &EventTime,
) -> ImportedStep {
    ImportedStep {
        position: existing_steps as i32 + 1,
        category: IMPORTED_STEP_CATEGORY,
        status: IMPORTED_STEP_STATUS,
        notes: summary.to_string(),
        scheduled_at: start.as_instant(),
        calendar_event_id: event_id.to_string(),
        calendar_event_summary: summary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_import_into_process_with_two_steps_takes_position_three() {
        let start = EventTime::DateTime(Utc::now());
        let step = step_from_event(2, "evt_9", "Final round with VP", &start);

        assert_eq!(step.position, 3);
        assert_eq!(step.category, "other");
        assert_eq!(step.status, "upcoming");
        assert_eq!(step.notes, "Final round with VP");
        assert_eq!(step.calendar_event_id, "evt_9");
        assert_eq!(step.calendar_event_summary, "Final round with VP");
    }

    #[test]
    fn test_import_into_empty_process_takes_position_one() {
        let start = EventTime::DateTime(Utc::now());
        let step = step_from_event(0, "evt_1", "Intro call", &start);
        assert_eq!(step.position, 1);
    }

    #[test]
    fn test_import_from_all_day_event_schedules_midnight() {
        let start = EventTime::Date(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
        let step = step_from_event(1, "evt_2", "Onsite day", &start);
        assert_eq!(step.scheduled_at.to_rfc3339(), "2026-04-02T00:00:00+00:00");
    }
}
