//! Orders placed from the pricing page.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub plan_id: String,
    pub plan: String,
    pub price: f64,
    pub currency: String,
    pub status: String,
    pub created_at: String,
}

/// Body of `POST /api/orders`: contact fields plus the selected plan copied verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
}

impl Order {
    pub async fn create(db: &SqlitePool, input: &OrderInput) -> Result<Order, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO orders (id, name, email, phone, message, plan_id, plan, price, currency,
                status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.message)
        .bind(&input.plan_id)
        .bind(&input.plan)
        .bind(input.price)
        .bind(&input.currency)
        .bind(OrderStatus::Pending.as_str())
        .bind(now())
        .execute(db)
        .await?;

        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    pub async fn list(db: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(db)
            .await
    }

    pub async fn get_by_id(db: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn set_status(
        db: &SqlitePool,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get_by_id(db, id).await
    }

    pub async fn count_by_status(db: &SqlitePool, status: OrderStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(db)
            .await
    }
}
