//! Database seeders for built-in data
//!
//! Seeds the three pricing tiers the public pricing page is laid out for.
//! Seeding only happens while the table is empty, so plans edited or removed
//! in the dashboard are never overwritten.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::models::{PricingPlan, PricingPlanFields};

/// Seed default pricing plans when no plan exists yet
pub async fn seed_pricing_plans(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pricing_plans")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    info!("Seeding default pricing plans...");

    // Format: (name, tagline, price, period, features, popular, is_custom)
    let plans: Vec<(&str, &str, f64, &str, Vec<&str>, bool, bool)> = vec![
        (
            "Starter",
            "For new brands finding their voice",
            1500.0,
            "project",
            vec![
                "Brand discovery workshop",
                "Logo and visual identity",
                "5-page responsive website",
                "Two revision rounds",
            ],
            false,
            false,
        ),
        (
            "Growth",
            "For teams ready to scale their reach",
            4500.0,
            "project",
            vec![
                "Everything in Starter",
                "Custom web application",
                "Campaign strategy and ad creatives",
                "Analytics and monthly reporting",
                "Priority support",
            ],
            true,
            false,
        ),
        (
            "Custom",
            "Tailored engagements for complex products",
            0.0,
            "",
            vec![
                "Dedicated project team",
                "AI automation and integrations",
                "Video production",
                "Flexible scope and timeline",
            ],
            false,
            true,
        ),
    ];

    for (name, tagline, price, period, features, popular, is_custom) in plans {
        let fields = PricingPlanFields {
            name: name.to_string(),
            tagline: tagline.to_string(),
            price,
            currency: "USD".to_string(),
            period: period.to_string(),
            features: features.iter().map(|f| f.to_string()).collect(),
            popular,
            is_custom,
            category: None,
            pages: None,
            duration: None,
            platforms: Vec::new(),
        };
        PricingPlan::create(pool, &fields).await?;
    }

    info!("Seeded 3 pricing plans");
    Ok(())
}
