use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{map_unique_violation, parse_uuid};
use crate::{
    db::{
        error::DbResult,
        repos::{UserRepo, truncate_to_millis},
    },
    models::{CreateUser, User, UserRef},
};

/// Emails bound per lookup query, below SQLite's host parameter limit.
const EMAIL_BATCH_SIZE: usize = 500;

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_ref(row: &sqlx::sqlite::SqliteRow) -> DbResult<UserRef> {
        Ok(UserRef {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            email: row.get("email"),
        })
    }
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn create(&self, input: CreateUser) -> DbResult<User> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query("INSERT INTO users (id, email, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(&input.email)
            .bind(&input.name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("User with email '{}' already exists", input.email)
                })
            })?;

        Ok(User {
            id,
            email: input.email,
            name: input.name,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(User {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                email: row.get("email"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRef>> {
        let row = sqlx::query("SELECT id, email FROM users WHERE LOWER(email) = LOWER(?)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_ref).transpose()
    }

    async fn find_by_emails(&self, emails: &[String]) -> DbResult<Vec<UserRef>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let mut users = Vec::with_capacity(emails.len());
        for batch in emails.chunks(EMAIL_BATCH_SIZE) {
            let placeholders = batch
                .iter()
                .map(|_| "LOWER(?)")
                .collect::<Vec<_>>()
                .join(", ");
            let query = format!(
                "SELECT id, email FROM users WHERE LOWER(email) IN ({})",
                placeholders
            );

            let mut query_builder = sqlx::query(&query);
            for email in batch {
                query_builder = query_builder.bind(email);
            }

            let rows = query_builder.fetch_all(&self.pool).await?;
            for row in &rows {
                users.push(Self::parse_ref(row)?);
            }
        }
        Ok(users)
    }
}
