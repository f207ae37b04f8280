use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::BoxError;

/// Append-only record of who started the quiz.
#[async_trait]
pub trait LoginLog: Send + Sync {
    async fn record_login(&self, login: &str, at: DateTime<Utc>) -> Result<(), BoxError>;
}

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> Result<Self, BoxError> {
        let pool = PgPool::connect(connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn perform_migrations(&self) -> Result<(), BoxError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LoginLog for Connection {
    async fn record_login(&self, login: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        log::debug!("Recording login of {}", login);
        sqlx::query("INSERT INTO logins (id, login, logged_at) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(login)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
