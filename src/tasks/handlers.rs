use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::error::{bounded, AppError};
use crate::state::AppState;
use crate::tasks::dto::{NewTaskRequest, Task, UserTasksQuery};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task).get(get_all_tasks))
        .route(
            "/tasks/:task_id",
            get(get_task_by_id).delete(delete_task_by_id),
        )
        .route("/user/tasks", get(get_users_tasks))
        .route("/user/task/track/:user_id/:task_id", post(start_tracker))
        .route("/user/task/stop/:user_id/:task_id", post(stop_tracker))
}

/// An absent or empty query parameter means "unbounded".
fn parse_bound(raw: Option<&str>) -> Result<Option<OffsetDateTime>, time::error::Parse> {
    match raw {
        None | Some("") => Ok(None),
        Some(v) => OffsetDateTime::parse(v, &Rfc3339).map(Some),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<NewTaskRequest>,
) -> Result<Json<Task>, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.tasks.create_task(&payload.name, payload.user_id),
    )
    .await
    {
        Ok(task) => {
            info!(task_id = task.id, user_id = task.user_id, "task created");
            Ok(Json(task))
        }
        Err(AppError::UserNotExists) => {
            warn!(user_id = payload.user_id, "task creation against missing user");
            Err((StatusCode::BAD_REQUEST, "Invalid user_id".into()))
        }
        Err(e) => {
            error!(error = %e, "create_task failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_task_by_id(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<Json<Task>, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.tasks.get_task_by_id(task_id),
    )
    .await
    {
        Ok(task) => Ok(Json(task)),
        Err(AppError::TaskNotFound) => {
            info!(task_id, "task not found");
            Err((StatusCode::NOT_FOUND, "Not Found".into()))
        }
        Err(e) => {
            error!(error = %e, task_id, "get_task_by_id failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_task_by_id(
    State(state): State<AppState>,
    Path(task_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.tasks.delete_task_by_id(task_id),
    )
    .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!(error = %e, task_id, "delete_task_by_id failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_users_tasks(
    State(state): State<AppState>,
    Query(q): Query<UserTasksQuery>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    let start_time = match parse_bound(q.start_time.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            info!(error = %e, "invalid start_time");
            return Err((StatusCode::BAD_REQUEST, "Invalid start_time format".into()));
        }
    };
    let end_time = match parse_bound(q.end_time.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            info!(error = %e, "invalid end_time");
            return Err((StatusCode::BAD_REQUEST, "Invalid end_time format".into()));
        }
    };

    match bounded(
        state.config.request_timeout,
        state
            .tasks
            .get_tasks_by_user_id(q.user_id, start_time, end_time),
    )
    .await
    {
        Ok(tasks) => Ok(Json(tasks)),
        Err(e) => {
            error!(error = %e, user_id = q.user_id, "get_users_tasks failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn start_tracker(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(i32, i32)>,
) -> Result<StatusCode, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.tasks.start_time_tracker(task_id, user_id),
    )
    .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(AppError::TaskNotFound) => {
            info!(task_id, user_id, "tracker target not found");
            Err((StatusCode::NOT_FOUND, "Task not Found".into()))
        }
        Err(e) => {
            error!(error = %e, task_id, user_id, "start_tracker failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn stop_tracker(
    State(state): State<AppState>,
    Path((user_id, task_id)): Path<(i32, i32)>,
) -> Result<StatusCode, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.tasks.stop_time_tracker(task_id, user_id),
    )
    .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(AppError::TaskNotFound) => {
            info!(task_id, user_id, "tracker target not found");
            Err((StatusCode::NOT_FOUND, "Task not Found".into()))
        }
        Err(e) => {
            error!(error = %e, task_id, user_id, "stop_tracker failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_all_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    match bounded(state.config.request_timeout, state.tasks.get_all_tasks()).await {
        Ok(tasks) => Ok(Json(tasks)),
        Err(e) => {
            error!(error = %e, "get_all_tasks failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn absent_and_empty_bounds_mean_unbounded() {
        assert_eq!(parse_bound(None).unwrap(), None);
        assert_eq!(parse_bound(Some("")).unwrap(), None);
    }

    #[test]
    fn rfc3339_bounds_parse() {
        let parsed = parse_bound(Some("2024-07-01T09:30:00Z")).unwrap();
        assert_eq!(parsed, Some(datetime!(2024-07-01 09:30:00 UTC)));
    }

    #[test]
    fn non_rfc3339_bounds_are_rejected() {
        assert!(parse_bound(Some("2024-07-01")).is_err());
        assert!(parse_bound(Some("yesterday")).is_err());
    }
}
