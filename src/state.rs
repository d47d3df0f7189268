use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::crypto::{AesPassportCipher, PassportCodec};
use crate::identity::{HttpIdentityClient, IdentityClient};
use crate::tasks::repo::TasksRepo;
use crate::tasks::services::TaskService;
use crate::users::repo::UsersRepo;
use crate::users::services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub users: UserService,
    pub tasks: TaskService,
    pub identity: Arc<dyn IdentityClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let codec = Arc::new(
            AesPassportCipher::new(config.encryption_key.as_bytes())
                .context("ENCRYPTION_KEY must be 32 bytes")?,
        ) as Arc<dyn PassportCodec>;

        let identity = Arc::new(HttpIdentityClient::new(
            &config.identity_api_url,
            config.request_timeout,
        )?) as Arc<dyn IdentityClient>;

        Ok(Self::from_parts(db, config, codec, identity))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        codec: Arc<dyn PassportCodec>,
        identity: Arc<dyn IdentityClient>,
    ) -> Self {
        let users = UserService::new(UsersRepo::new(db.clone(), codec));
        let tasks = TaskService::new(TasksRepo::new(db.clone()));

        Self {
            db,
            config,
            users,
            tasks,
            identity,
        }
    }
}
