use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::tasks::dto::Task;

const TASK_COLUMNS: &str = "id, name, user_id, start_time, end_time";

#[derive(Clone)]
pub struct TasksRepo {
    db: PgPool,
}

impl TasksRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Checks the owner row exists before inserting. A missing owner is a
    /// domain condition, not a storage failure, and no FK error parsing is
    /// involved.
    pub async fn add_task(&self, name: &str, user_id: i32) -> Result<Task, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::UserNotExists);
        }

        let task: Task = sqlx::query_as(&format!(
            r#"
            INSERT INTO tasks (name, user_id, start_time, end_time)
            VALUES ($1, $2, NULL, NULL)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(task)
    }

    pub async fn find_task_by_id(&self, id: i32) -> Result<Task, AppError> {
        let task: Option<Task> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        task.ok_or(AppError::TaskNotFound)
    }

    /// Time-filtered listing for one user. Matching tasks are ranked by
    /// descending tracked duration only when both bounds are supplied;
    /// otherwise storage order stands.
    pub async fn find_tasks_by_user_id(
        &self,
        user_id: i32,
        start_time: Option<OffsetDateTime>,
        end_time: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, AppError> {
        let mut query = tasks_by_user_query(user_id, start_time, end_time);
        Ok(query.build_query_as().fetch_all(&self.db).await?)
    }

    /// Deliberately indifferent to whether the row existed.
    pub async fn delete_task_by_id(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Stamps the start of the tracked interval with the current wall clock.
    /// Repeated starts overwrite: last write wins, there is no "already
    /// started" detection.
    pub async fn start_time_tracker(&self, task_id: i32, user_id: i32) -> Result<(), AppError> {
        self.stamp_tracker("start_time", task_id, user_id).await
    }

    /// Stamps the end of the tracked interval; same overwrite semantics as
    /// the start, and no guard against stopping before starting.
    pub async fn stop_time_tracker(&self, task_id: i32, user_id: i32) -> Result<(), AppError> {
        self.stamp_tracker("end_time", task_id, user_id).await
    }

    /// One atomic conditional UPDATE. Zero affected rows means the
    /// `(task_id, user_id)` pair points at nothing this caller may track —
    /// wrong task and wrong user are indistinguishable on purpose.
    async fn stamp_tracker(
        &self,
        column: &'static str,
        task_id: i32,
        user_id: i32,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            "UPDATE tasks SET {column} = $1 WHERE id = $2 AND user_id = $3"
        ))
        .bind(OffsetDateTime::now_utc())
        .bind(task_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TaskNotFound);
        }
        Ok(())
    }

    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY user_id DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(tasks)
    }
}

/// Dynamic query over the user's tasks: the owner predicate is always
/// present, each supplied bound adds one condition, and the duration
/// ordering appears only when the interval is pinned on both sides.
fn tasks_by_user_query(
    user_id: i32,
    start_time: Option<OffsetDateTime>,
    end_time: Option<OffsetDateTime>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "
    ));
    qb.push_bind(user_id);

    if let Some(start) = start_time {
        qb.push(" AND start_time >= ");
        qb.push_bind(start);
    }
    if let Some(end) = end_time {
        qb.push(" AND end_time <= ");
        qb.push_bind(end);
    }

    // Ranking by duration against a half-open window would be meaningless.
    if start_time.is_some() && end_time.is_some() {
        qb.push(" ORDER BY (end_time - start_time) DESC");
    }
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const BASE: &str = "SELECT id, name, user_id, start_time, end_time FROM tasks WHERE user_id = $1";

    #[test]
    fn unbounded_listing_keeps_storage_order() {
        let sql = tasks_by_user_query(1, None, None).into_sql();
        assert_eq!(sql, BASE);
    }

    #[test]
    fn start_bound_alone_filters_without_ordering() {
        let sql =
            tasks_by_user_query(1, Some(datetime!(2024-07-01 00:00:00 UTC)), None).into_sql();
        assert_eq!(sql, format!("{BASE} AND start_time >= $2"));
    }

    #[test]
    fn end_bound_alone_filters_without_ordering() {
        let sql = tasks_by_user_query(1, None, Some(datetime!(2024-07-02 00:00:00 UTC))).into_sql();
        assert_eq!(sql, format!("{BASE} AND end_time <= $2"));
    }

    #[test]
    fn both_bounds_rank_by_descending_duration() {
        let sql = tasks_by_user_query(
            1,
            Some(datetime!(2024-07-01 00:00:00 UTC)),
            Some(datetime!(2024-07-02 00:00:00 UTC)),
        )
        .into_sql();
        assert_eq!(
            sql,
            format!(
                "{BASE} AND start_time >= $2 AND end_time <= $3 \
                 ORDER BY (end_time - start_time) DESC"
            )
        );
    }
}
