//! Contact-form messages.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now, MessageStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

/// Body of `POST /api/contact`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot: hidden from people, filled in by bots
    #[serde(default)]
    pub website_url: String,
}

impl Message {
    pub async fn create(db: &SqlitePool, input: &ContactInput) -> Result<Message, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO messages (id, name, email, phone, message, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.message)
        .bind(MessageStatus::New.as_str())
        .bind(now())
        .execute(db)
        .await?;

        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    pub async fn list(db: &SqlitePool) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY created_at DESC")
            .fetch_all(db)
            .await
    }

    pub async fn set_status(
        db: &SqlitePool,
        id: &str,
        status: MessageStatus,
    ) -> Result<Option<Message>, sqlx::Error> {
        let result = sqlx::query("UPDATE messages SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn count_unread(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE status = ?")
            .bind(MessageStatus::New.as_str())
            .fetch_one(db)
            .await
    }
}
