use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recruitment process: one company + role the user is interviewing for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcessRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub role: String,
    /// "active" | "on_hold" | "rejected" | "offer" | "closed"
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One interview step within a process.
///
/// `calendar_event_id` / `calendar_event_summary` form a nullable weak
/// reference to an external calendar event: enough to display and to unlink,
/// no ownership and no sync guarantee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewStepRow {
    pub id: Uuid,
    pub process_id: Uuid,
    /// Ordinal position within the process, starting at 1.
    pub position: i32,
    /// One of `STEP_CATEGORIES`.
    pub category: String,
    /// "upcoming" | "completed" | "cancelled"
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub objectives: Vec<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub calendar_event_id: Option<String>,
    pub calendar_event_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const STEP_CATEGORIES: &[&str] = &[
    "phone_screen",
    "technical",
    "behavioral",
    "onsite",
    "offer",
    "other",
    "retrospective",
];

pub const STEP_STATUSES: &[&str] = &["upcoming", "completed", "cancelled"];

pub const PROCESS_STATUSES: &[&str] = &["active", "on_hold", "rejected", "offer", "closed"];

pub fn is_valid_category(category: &str) -> bool {
    STEP_CATEGORIES.contains(&category)
}

pub fn is_valid_step_status(status: &str) -> bool {
    STEP_STATUSES.contains(&status)
}

pub fn is_valid_process_status(status: &str) -> bool {
    PROCESS_STATUSES.contains(&status)
}

impl InterviewStepRow {
    /// Records a calendar event reference and aligns the scheduled date with
    /// the event's start time.
    pub fn apply_event_link(
        &mut self,
        event_id: &str,
        summary: &str,
        starts_at: DateTime<Utc>,
    ) {
        self.calendar_event_id = Some(event_id.to_string());
        self.calendar_event_summary = Some(summary.to_string());
        self.scheduled_at = Some(starts_at);
    }

    /// Clears the calendar event reference. Manually-set fields are untouched;
    /// the external event itself is never modified.
    pub fn clear_event_link(&mut self) {
        self.calendar_event_id = None;
        self.calendar_event_summary = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_step() -> InterviewStepRow {
        InterviewStepRow {
            id: Uuid::new_v4(),
            process_id: Uuid::new_v4(),
            position: 1,
            category: "technical".to_string(),
            status: "upcoming".to_string(),
            scheduled_at: None,
            objectives: vec!["review system design basics".to_string()],
            notes: Some("panel of two".to_string()),
            outcome: None,
            calendar_event_id: None,
            calendar_event_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_link_then_unlink_round_trip_preserves_manual_fields() {
        let mut step = sample_step();
        let starts = Utc::now();

        step.apply_event_link("evt_123", "Tech screen w/ Acme", starts);
        assert_eq!(step.calendar_event_id.as_deref(), Some("evt_123"));
        assert_eq!(
            step.calendar_event_summary.as_deref(),
            Some("Tech screen w/ Acme")
        );
        assert_eq!(step.scheduled_at, Some(starts));

        step.clear_event_link();
        assert!(step.calendar_event_id.is_none());
        assert!(step.calendar_event_summary.is_none());
        // Manually-set fields survive the round trip.
        assert_eq!(step.notes.as_deref(), Some("panel of two"));
        assert_eq!(step.status, "upcoming");
        assert_eq!(step.objectives, vec!["review system design basics"]);
    }

    #[test]
    fn test_category_validation() {
        assert!(is_valid_category("phone_screen"));
        assert!(is_valid_category("other"));
        assert!(is_valid_category("retrospective"));
        assert!(!is_valid_category("coffee_chat"));
    }

    #[test]
    fn test_step_status_validation() {
        assert!(is_valid_step_status("upcoming"));
        assert!(!is_valid_step_status("scheduled"));
    }

    #[test]
    fn test_process_status_validation() {
        assert!(is_valid_process_status("active"));
        assert!(is_valid_process_status("on_hold"));
        assert!(is_valid_process_status("closed"));
        assert!(!is_valid_process_status("ghosted"));
        assert!(!is_valid_process_status(""));
    }
}
