//! Pricing plan models, tier ordering and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now, parse_json_list, serialize_json_list};

/// Display order of the named tiers; any other name sorts after them
const TIER_ORDER: [&str; 3] = ["starter", "growth", "custom"];

/// Position of a plan name in the tier order (case-insensitive)
pub fn tier_rank(name: &str) -> usize {
    let name = name.trim().to_lowercase();
    TIER_ORDER
        .iter()
        .position(|tier| *tier == name)
        .unwrap_or(TIER_ORDER.len())
}

/// Sort plans Starter, Growth, Custom, then everything else in input order
pub fn sort_plans(plans: &mut [PricingPlanResponse]) {
    plans.sort_by_key(|plan| tier_rank(&plan.name));
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PricingPlan {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub price: f64,
    pub currency: String,
    pub period: String,
    /// JSON array
    pub features: String,
    pub popular: i64,
    pub is_custom: i64,
    pub category: Option<String>,
    pub pages: Option<String>,
    pub duration: Option<String>,
    /// JSON array
    pub platforms: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Pricing plan as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlanResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl From<PricingPlan> for PricingPlanResponse {
    fn from(plan: PricingPlan) -> Self {
        Self {
            features: parse_json_list(&plan.features),
            platforms: parse_json_list(&plan.platforms),
            id: plan.id,
            name: plan.name,
            tagline: plan.tagline,
            price: plan.price,
            currency: plan.currency,
            period: plan.period,
            popular: plan.popular != 0,
            is_custom: plan.is_custom != 0,
            category: plan.category,
            pages: plan.pages,
            duration: plan.duration,
        }
    }
}

/// Request body for creating or replacing a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingPlanInput {
    pub name: String,
    pub tagline: String,
    pub price: f64,
    pub currency: String,
    pub period: String,
    pub features: Vec<String>,
    pub popular: bool,
    pub is_custom: bool,
    pub category: Option<String>,
    pub pages: Option<String>,
    pub duration: Option<String>,
    pub platforms: Vec<String>,
}

/// Validated column values written by create/update
#[derive(Debug, Clone)]
pub struct PricingPlanFields {
    pub name: String,
    pub tagline: String,
    pub price: f64,
    pub currency: String,
    pub period: String,
    pub features: Vec<String>,
    pub popular: bool,
    pub is_custom: bool,
    pub category: Option<String>,
    pub pages: Option<String>,
    pub duration: Option<String>,
    pub platforms: Vec<String>,
}

impl PricingPlan {
    /// List plans, optionally for one service category, in tier order
    pub async fn list(
        db: &SqlitePool,
        category: Option<&str>,
    ) -> Result<Vec<PricingPlanResponse>, sqlx::Error> {
        let plans = sqlx::query_as::<_, PricingPlan>(
            "SELECT * FROM pricing_plans WHERE (? IS NULL OR category = ?) ORDER BY created_at ASC",
        )
        .bind(category)
        .bind(category)
        .fetch_all(db)
        .await?;

        let mut plans: Vec<PricingPlanResponse> =
            plans.into_iter().map(PricingPlanResponse::from).collect();
        sort_plans(&mut plans);
        Ok(plans)
    }

    pub async fn get_by_id(db: &SqlitePool, id: &str) -> Result<Option<PricingPlan>, sqlx::Error> {
        sqlx::query_as::<_, PricingPlan>("SELECT * FROM pricing_plans WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(
        db: &SqlitePool,
        fields: &PricingPlanFields,
    ) -> Result<PricingPlan, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();

        sqlx::query(
            r#"
            INSERT INTO pricing_plans (id, name, tagline, price, currency, period, features,
                popular, is_custom, category, pages, duration, platforms, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(&fields.tagline)
        .bind(fields.price)
        .bind(&fields.currency)
        .bind(&fields.period)
        .bind(serialize_json_list(&fields.features))
        .bind(fields.popular as i64)
        .bind(fields.is_custom as i64)
        .bind(&fields.category)
        .bind(&fields.pages)
        .bind(&fields.duration)
        .bind(serialize_json_list(&fields.platforms))
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as::<_, PricingPlan>("SELECT * FROM pricing_plans WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &SqlitePool,
        id: &str,
        fields: &PricingPlanFields,
    ) -> Result<Option<PricingPlan>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_plans SET
                name = ?, tagline = ?, price = ?, currency = ?, period = ?, features = ?,
                popular = ?, is_custom = ?, category = ?, pages = ?, duration = ?, platforms = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.tagline)
        .bind(fields.price)
        .bind(&fields.currency)
        .bind(&fields.period)
        .bind(serialize_json_list(&fields.features))
        .bind(fields.popular as i64)
        .bind(fields.is_custom as i64)
        .bind(&fields.category)
        .bind(&fields.pages)
        .bind(&fields.duration)
        .bind(serialize_json_list(&fields.platforms))
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
        let result = sqlx::query("DELETE FROM pricing_plans WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str) -> PricingPlanResponse {
        PricingPlanResponse {
            id: name.to_lowercase(),
            name: name.to_string(),
            tagline: String::new(),
            price: 0.0,
            currency: "USD".to_string(),
            period: String::new(),
            features: Vec::new(),
            popular: false,
            is_custom: false,
            category: None,
            pages: None,
            duration: None,
            platforms: Vec::new(),
        }
    }

    #[test]
    fn test_sort_plans_regardless_of_input_order() {
        let mut plans = vec![plan("Custom"), plan("Enterprise"), plan("Growth"), plan("Starter")];
        sort_plans(&mut plans);
        let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Starter", "Growth", "Custom", "Enterprise"]);
    }

    #[test]
    fn test_unknown_names_keep_their_relative_order() {
        let mut plans = vec![plan("Zeta"), plan("Alpha"), plan("Growth")];
        sort_plans(&mut plans);
        let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Growth", "Zeta", "Alpha"]);
    }

    #[test]
    fn test_tier_rank_is_case_insensitive() {
        assert_eq!(tier_rank(" starter "), 0);
        assert_eq!(tier_rank("GROWTH"), 1);
        assert_eq!(tier_rank("Custom"), 2);
        assert_eq!(tier_rank("Premium"), 3);
    }
}
