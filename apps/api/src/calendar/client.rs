//! Calendar query adapter.
//!
//! Given a valid (already refreshed) access token, lists events from the
//! user's primary calendar. Recurring series are expanded into individual
//! instances and results come back in start-time order. NOT_CONNECTED and
//! TOKEN_EXPIRED are decided by the token layer before this adapter runs;
//! any non-success here is a generic upstream failure.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default query window when the caller gives no bounds.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
/// Default result cap when the caller gives no maximum.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Start or end of an event: all-day events carry a bare date, timed events
/// a full instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// Instant used for ordering; all-day events sort at midnight UTC.
    pub fn as_instant(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// A calendar event as returned to the frontend and to the step linker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub location: Option<String>,
    /// Provider deep-link for opening the event.
    pub html_link: Option<String>,
}

/// Event listing parameters; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub text_filter: Option<String>,
    pub max_results: Option<usize>,
}

impl EventQuery {
    /// Applies the default window (now through +30 days) and result cap.
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, usize) {
        let time_min = self.time_min.unwrap_or(now);
        let time_max = self
            .time_max
            .unwrap_or(time_min + Duration::days(DEFAULT_WINDOW_DAYS));
        let max_results = self.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        (time_min, time_max, max_results)
    }
}

/// Lists events from the primary calendar, expanded and start-time ordered.
pub async fn list_events(
    http: &reqwest::Client,
    access_token: &str,
    query: &EventQuery,
) -> Result<Vec<CalendarEvent>, AppError> {
    let (time_min, time_max, max_results) = query.resolve(Utc::now());

    let url = format!("{CALENDAR_API_BASE}/calendars/primary/events");
    let mut request = http
        .get(&url)
        .bearer_auth(access_token)
        .query(&[
            ("timeMin", time_min.to_rfc3339()),
            ("timeMax", time_max.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", max_results.to_string()),
        ]);

    if let Some(q) = query.text_filter.as_deref().filter(|q| !q.is_empty()) {
        request = request.query(&[("q", q)]);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("calendar request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "calendar fetch failed ({status}): {body}"
        )));
    }

    let body: EventListResponse = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("invalid calendar response: {e}")))?;

    let mut events: Vec<CalendarEvent> = body
        .items
        .into_iter()
        .filter_map(convert_event)
        .collect();
    events.sort_by_key(|e| e.start.as_instant());
    events.truncate(max_results);

    debug!("fetched {} calendar events", events.len());
    Ok(events)
}

/// Best-effort token revocation at the provider. Failures are logged and
/// swallowed so local cleanup can always proceed.
pub async fn revoke_token(http: &reqwest::Client, revoke_url: &str, token: &str) {
    let result = http
        .post(revoke_url)
        .form(&[("token", token)])
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            debug!("revoked provider token");
        }
        Ok(response) => {
            warn!("provider revoke returned {}", response.status());
        }
        Err(e) => {
            warn!("provider revoke request failed: {e}");
        }
    }
}

fn convert_event(event: ApiEvent) -> Option<CalendarEvent> {
    // Cancelled instances of expanded series carry no useful payload.
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = parse_event_time(&event.start, &id)?;
    let end = parse_event_time(&event.end, &id)?;

    Some(CalendarEvent {
        id,
        summary: event.summary.unwrap_or_default(),
        start,
        end,
        location: event.location,
        html_link: event.html_link,
    })
}

fn parse_event_time(time: &ApiEventTime, event_id: &str) -> Option<EventTime> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => {
            let parsed = DateTime::parse_from_rfc3339(dt)
                .map_err(|e| warn!("event {event_id}: bad dateTime: {e}"))
                .ok()?;
            Some(EventTime::DateTime(parsed.with_timezone(&Utc)))
        }
        (None, Some(date)) => {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| warn!("event {event_id}: bad date: {e}"))
                .ok()?;
            Some(EventTime::Date(parsed))
        }
        (None, None) => {
            warn!("event {event_id} has no start/end time");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    html_link: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_now_plus_30_days() {
        let now = Utc::now();
        let (time_min, time_max, max) = EventQuery::default().resolve(now);
        assert_eq!(time_min, now);
        assert_eq!(time_max, now + Duration::days(30));
        assert_eq!(max, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_explicit_bounds_override_defaults() {
        let now = Utc::now();
        let query = EventQuery {
            time_min: Some(now - Duration::days(1)),
            time_max: Some(now + Duration::days(7)),
            text_filter: None,
            max_results: Some(10),
        };
        let (time_min, time_max, max) = query.resolve(now);
        assert_eq!(time_min, now - Duration::days(1));
        assert_eq!(time_max, now + Duration::days(7));
        assert_eq!(max, 10);
    }

    #[test]
    fn test_parse_timed_event() {
        let json = r#"{
            "id": "evt1",
            "summary": "Phone screen",
            "start": { "dateTime": "2026-03-15T10:00:00Z" },
            "end": { "dateTime": "2026-03-15T11:00:00Z" },
            "htmlLink": "https://calendar.google.com/event?eid=abc",
            "status": "confirmed"
        }"#;

        let api: ApiEvent = serde_json::from_str(json).unwrap();
        let event = convert_event(api).unwrap();
        assert_eq!(event.id, "evt1");
        assert_eq!(event.summary, "Phone screen");
        assert!(matches!(event.start, EventTime::DateTime(_)));
        assert_eq!(
            event.html_link.as_deref(),
            Some("https://calendar.google.com/event?eid=abc")
        );
    }

    #[test]
    fn test_parse_all_day_event() {
        let json = r#"{
            "id": "evt2",
            "summary": "Onsite loop",
            "start": { "date": "2026-03-20" },
            "end": { "date": "2026-03-21" }
        }"#;

        let api: ApiEvent = serde_json::from_str(json).unwrap();
        let event = convert_event(api).unwrap();
        let EventTime::Date(d) = event.start else {
            panic!("expected all-day start");
        };
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
    }

    #[test]
    fn test_cancelled_events_are_dropped() {
        let json = r#"{
            "id": "evt3",
            "summary": "Cancelled",
            "start": { "dateTime": "2026-03-15T10:00:00Z" },
            "end": { "dateTime": "2026-03-15T11:00:00Z" },
            "status": "cancelled"
        }"#;

        let api: ApiEvent = serde_json::from_str(json).unwrap();
        assert!(convert_event(api).is_none());
    }

    #[test]
    fn test_event_without_id_is_dropped() {
        let json = r#"{
            "summary": "No id",
            "start": { "dateTime": "2026-03-15T10:00:00Z" },
            "end": { "dateTime": "2026-03-15T11:00:00Z" }
        }"#;

        let api: ApiEvent = serde_json::from_str(json).unwrap();
        assert!(convert_event(api).is_none());
    }

    #[test]
    fn test_all_day_event_sorts_at_midnight() {
        let time = EventTime::Date(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
        let instant = time.as_instant();
        assert_eq!(instant.to_rfc3339(), "2026-03-20T00:00:00+00:00");
    }

    #[test]
    fn test_event_time_serializes_both_shapes() {
        let timed = EventTime::DateTime("2026-03-15T10:00:00Z".parse().unwrap());
        assert_eq!(
            serde_json::to_string(&timed).unwrap(),
            "\"2026-03-15T10:00:00Z\""
        );

        let all_day = EventTime::Date(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
        assert_eq!(serde_json::to_string(&all_day).unwrap(), "\"2026-03-20\"");
    }
}
