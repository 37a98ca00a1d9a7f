//! Site-wide settings stored as one JSON document.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::common::now;

const SITE_SETTINGS_KEY: &str = "site";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub tagline: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub instagram: String,
    pub linkedin: String,
    pub behance: String,
    pub twitter: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Atelier".to_string(),
            tagline: "Creative studio for brands, products and stories".to_string(),
            contact_email: "hello@example.com".to_string(),
            contact_phone: String::new(),
            address: String::new(),
            instagram: String::new(),
            linkedin: String::new(),
            behance: String::new(),
            twitter: String::new(),
        }
    }
}

impl SiteSettings {
    /// Load the stored settings, falling back to defaults when never saved
    pub async fn load(db: &SqlitePool) -> Result<SiteSettings, sqlx::Error> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(SITE_SETTINGS_KEY)
            .fetch_optional(db)
            .await?;

        Ok(match value {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored site settings are unreadable, using defaults");
                SiteSettings::default()
            }),
            None => SiteSettings::default(),
        })
    }

    pub async fn save(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(SITE_SETTINGS_KEY)
        .bind(json)
        .bind(now())
        .execute(db)
        .await?;
        Ok(())
    }
}
