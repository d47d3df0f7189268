use time::OffsetDateTime;

use crate::error::AppError;
use crate::tasks::dto::Task;
use crate::tasks::repo::TasksRepo;

/// Thin orchestration over the repository; no business logic of its own.
#[derive(Clone)]
pub struct TaskService {
    repo: TasksRepo,
}

impl TaskService {
    pub fn new(repo: TasksRepo) -> Self {
        Self { repo }
    }

    pub async fn create_task(&self, name: &str, user_id: i32) -> Result<Task, AppError> {
        self.repo.add_task(name, user_id).await
    }

    pub async fn get_task_by_id(&self, task_id: i32) -> Result<Task, AppError> {
        self.repo.find_task_by_id(task_id).await
    }

    pub async fn get_tasks_by_user_id(
        &self,
        user_id: i32,
        start_time: Option<OffsetDateTime>,
        end_time: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, AppError> {
        self.repo
            .find_tasks_by_user_id(user_id, start_time, end_time)
            .await
    }

    pub async fn delete_task_by_id(&self, task_id: i32) -> Result<(), AppError> {
        self.repo.delete_task_by_id(task_id).await
    }

    pub async fn start_time_tracker(&self, task_id: i32, user_id: i32) -> Result<(), AppError> {
        self.repo.start_time_tracker(task_id, user_id).await
    }

    pub async fn stop_time_tracker(&self, task_id: i32, user_id: i32) -> Result<(), AppError> {
        self.repo.stop_time_tracker(task_id, user_id).await
    }

    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, AppError> {
        self.repo.get_all_tasks().await
    }
}
