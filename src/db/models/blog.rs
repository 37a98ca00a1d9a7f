//! Blog post models and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::now;

/// A blog post. `text` is trusted HTML authored in the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Request body for creating or replacing a blog post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogInput {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub author: String,
    pub image: String,
    pub text: String,
    pub excerpt: String,
    /// Defaults to today when empty
    pub publication_date: String,
}

impl Blog {
    pub async fn list(db: &SqlitePool, limit: Option<i64>) -> Result<Vec<Blog>, sqlx::Error> {
        sqlx::query_as::<_, Blog>(
            "SELECT * FROM blogs ORDER BY publication_date DESC, created_at DESC LIMIT ?",
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(db)
        .await
    }

    pub async fn get_by_id(db: &SqlitePool, id: &str) -> Result<Option<Blog>, sqlx::Error> {
        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn get_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Blog>, sqlx::Error> {
        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE slug = ?")
            .bind(slug)
            .fetch_optional(db)
            .await
    }

    /// Insert a post; `input` must already be validated and carry a slug.
    pub async fn create(db: &SqlitePool, input: &BlogInput) -> Result<Blog, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();

        sqlx::query(
            r#"
            INSERT INTO blogs (id, title, slug, category, author, image, text, excerpt,
                publication_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.category)
        .bind(&input.author)
        .bind(&input.image)
        .bind(&input.text)
        .bind(&input.excerpt)
        .bind(&input.publication_date)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &SqlitePool,
        id: &str,
        input: &BlogInput,
    ) -> Result<Option<Blog>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE blogs SET
                title = ?, slug = ?, category = ?, author = ?, image = ?, text = ?,
                excerpt = ?, publication_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.category)
        .bind(&input.author)
        .bind(&input.image)
        .bind(&input.text)
        .bind(&input.excerpt)
        .bind(&input.publication_date)
        .bind(now())
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get_by_id(db, id).await
    }

    pub async fn delete(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blogs")
            .fetch_one(db)
            .await
    }
}
