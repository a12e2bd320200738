use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Appointment,
    Medication,
    Other,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventKind(pub String);

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Appointment => "appointment",
            EventKind::Medication => "medication",
            EventKind::Other => "other",
        }
    }
}

impl TryFrom<String> for EventKind {
    type Error = UnknownEventKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "appointment" => Ok(EventKind::Appointment),
            "medication" => Ok(EventKind::Medication),
            "other" => Ok(EventKind::Other),
            _ => Err(UnknownEventKind(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub baby_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: EventKind,
    pub title: String,
    pub details: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub frequency: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub baby_id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub details: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub frequency: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Partial update; `None` leaves the column unchanged. The owning baby
/// cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,
    pub title: Option<String>,
    pub details: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub frequency: Option<String>,
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_text() {
        for kind in [EventKind::Appointment, EventKind::Medication, EventKind::Other] {
            assert_eq!(EventKind::try_from(kind.as_str().to_string()).unwrap(), kind);
        }
        assert!(EventKind::try_from("vaccine".to_string()).is_err());
    }

    #[test]
    fn new_event_reads_client_field_names() {
        let body = serde_json::json!({
            "babyId": "7f1d0c52-1111-4a3e-9c1b-7f2b9d7e0a01",
            "type": "medication",
            "title": "Vitamin D",
            "scheduledAt": "2026-01-02T08:00:00Z",
            "frequency": "daily"
        });
        let event: NewEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.kind, EventKind::Medication);
        assert_eq!(event.frequency.as_deref(), Some("daily"));
        assert!(!event.completed);
    }
}
