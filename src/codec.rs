//! Stored form of the task sequence: a JSON array of task records.
//!
//! Field names are camelCase (`endDate`, `createdDate`) so payloads stay
//! readable by anything else that reads the same storage key.

use crate::gateway::PersistError;
use crate::model::Task;

pub fn encode(tasks: &[Task]) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec(tasks).map_err(|e| PersistError::Encode(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Task>, PersistError> {
    serde_json::from_slice(bytes).map_err(|e| PersistError::Decode(e.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Subtask};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn full_task() -> Task {
        let mut t = Task::new("Write report".into(), Priority::High, Utc::now());
        t.completed = true;
        t.end_date = Some(Utc.with_ymd_and_hms(2026, 11, 3, 17, 30, 0).unwrap());
        t.subtasks.push(Subtask::new("outline"));
        t.subtasks.push(Subtask { text: "draft".into(), completed: true });
        t
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let tasks = vec![
            full_task(),
            Task::new("Bare".into(), Priority::Low, Utc::now()),
        ];
        let bytes = encode(&tasks).unwrap();
        assert_eq!(decode(&bytes).unwrap(), tasks);
    }

    #[test]
    fn record_field_names() {
        let bytes = encode(&[full_task()]).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        let record = &json[0];

        for key in ["id", "text", "completed", "priority", "endDate", "createdDate", "subtasks"] {
            assert!(record.get(key).is_some(), "missing {key}");
        }
        assert_eq!(record["priority"], "High");
        assert_eq!(record["subtasks"][1]["completed"], true);
    }

    #[test]
    fn absent_end_date_is_omitted() {
        let bytes = encode(&[Task::new("x".into(), Priority::Medium, Utc::now())]).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json[0].get("endDate").is_none());
    }

    #[test]
    fn sparse_records_get_defaults() {
        let raw = br#"[{
            "id": "6b3c18d4-2a1d-4f2b-9d4c-0a0c3f0f2f10",
            "text": "old entry",
            "priority": "Low",
            "createdDate": "2025-01-01T00:00:00Z"
        }]"#;
        let tasks = decode(raw).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].completed);
        assert!(tasks[0].subtasks.is_empty());
        assert_eq!(tasks[0].end_date, None);
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(decode(b"nope"), Err(PersistError::Decode(_))));
        assert!(matches!(decode(br#"[{"text": 1}]"#), Err(PersistError::Decode(_))));
    }
}
