use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// A task with its single tracked interval. Both ends are null until the
/// tracker touches them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

/// Request body for task creation.
#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    pub name: String,
    pub user_id: i32,
}

/// Query string of `GET /user/tasks`; the bounds are RFC3339 and optional.
#[derive(Debug, Deserialize)]
pub struct UserTasksQuery {
    pub user_id: i32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fresh_task_serializes_null_interval() {
        let task = Task {
            id: 1,
            name: "write report".into(),
            user_id: 1,
            start_time: None,
            end_time: None,
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""start_time":null"#));
        assert!(json.contains(r#""end_time":null"#));
        assert!(json.contains(r#""user_id":1"#));
    }

    #[test]
    fn tracked_task_serializes_rfc3339_timestamps() {
        let task = Task {
            id: 2,
            name: "review".into(),
            user_id: 1,
            start_time: Some(datetime!(2024-07-01 09:30:00 UTC)),
            end_time: Some(datetime!(2024-07-01 11:00:00 UTC)),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""start_time":"2024-07-01T09:30:00Z""#));
        assert!(json.contains(r#""end_time":"2024-07-01T11:00:00Z""#));
    }
}
