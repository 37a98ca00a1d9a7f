//! Blog post and pricing plan actions.

use super::compact;
use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{
    validate_currency, validate_date, validate_optional_url, validate_price, validate_required,
    validate_slug,
};
use crate::db::{
    slugify, Blog, BlogInput, PricingPlan, PricingPlanFields, PricingPlanInput,
    PricingPlanResponse,
};
use crate::forms::Submission;
use crate::AppState;

pub async fn get_blogs(state: &AppState, limit: Option<i64>) -> Result<Vec<Blog>, ApiError> {
    Ok(Blog::list(&state.db, limit).await?)
}

fn validate_blog(input: &BlogInput) -> Result<BlogInput, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("title", validate_required(&input.title, "Title", 200));
    let slug = match input.slug.trim() {
        "" => slugify(&input.title),
        slug => slug.to_string(),
    };
    errors.check("slug", validate_slug(&slug));
    errors.check("image", validate_optional_url(&input.image));
    errors.check("publicationDate", validate_date(&input.publication_date));
    errors.finish()?;

    let publication_date = match input.publication_date.trim() {
        "" => chrono::Utc::now().format("%Y-%m-%d").to_string(),
        date => date.to_string(),
    };

    Ok(BlogInput {
        title: input.title.trim().to_string(),
        slug,
        category: input.category.trim().to_string(),
        author: input.author.trim().to_string(),
        image: input.image.trim().to_string(),
        text: input.text.clone(),
        excerpt: input.excerpt.trim().to_string(),
        publication_date,
    })
}

/// Create (`id` is `None`) or replace a blog post
pub async fn save_blog(state: &AppState, id: Option<&str>, input: &BlogInput) -> Result<Blog, ApiError> {
    let input = validate_blog(input)?;
    let blog = match id {
        None => Blog::create(&state.db, &input).await?,
        Some(id) => Blog::update(&state.db, id, &input)
            .await?
            .ok_or_else(|| ApiError::not_found("Blog not found"))?,
    };
    tracing::info!(id = %blog.id, slug = %blog.slug, "Blog saved");
    Ok(blog)
}

pub async fn create_blog(state: &AppState, submission: &Submission) -> Result<Blog, ApiError> {
    save_blog(state, None, &BlogInput::try_from(submission)?).await
}

pub async fn update_blog(state: &AppState, id: &str, submission: &Submission) -> Result<Blog, ApiError> {
    save_blog(state, Some(id), &BlogInput::try_from(submission)?).await
}

pub async fn delete_blog(state: &AppState, id: &str) -> Result<(), ApiError> {
    if !Blog::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Blog not found"));
    }
    tracing::info!(%id, "Blog deleted");
    Ok(())
}

pub async fn get_pricing_plans(
    state: &AppState,
    category: Option<&str>,
) -> Result<Vec<PricingPlanResponse>, ApiError> {
    Ok(PricingPlan::list(&state.db, category).await?)
}

fn validate_pricing_plan(input: &PricingPlanInput) -> Result<PricingPlanFields, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("name", validate_required(&input.name, "Name", 80));
    errors.check("price", validate_price(input.price));
    let currency = match input.currency.trim() {
        "" => "USD".to_string(),
        currency => currency.to_uppercase(),
    };
    errors.check("currency", validate_currency(&currency));
    errors.finish()?;

    let optional = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Ok(PricingPlanFields {
        name: input.name.trim().to_string(),
        tagline: input.tagline.trim().to_string(),
        price: input.price,
        currency,
        period: input.period.trim().to_string(),
        features: compact(&input.features),
        popular: input.popular,
        is_custom: input.is_custom,
        category: optional(&input.category),
        pages: optional(&input.pages),
        duration: optional(&input.duration),
        platforms: compact(&input.platforms),
    })
}

/// Create (`id` is `None`) or replace a pricing plan
pub async fn save_pricing_plan(
    state: &AppState,
    id: Option<&str>,
    input: &PricingPlanInput,
) -> Result<PricingPlanResponse, ApiError> {
    let fields = validate_pricing_plan(input)?;
    let plan = match id {
        None => PricingPlan::create(&state.db, &fields).await?,
        Some(id) => PricingPlan::update(&state.db, id, &fields)
            .await?
            .ok_or_else(|| ApiError::not_found("Pricing plan not found"))?,
    };
    tracing::info!(id = %plan.id, name = %plan.name, "Pricing plan saved");
    Ok(plan.into())
}

pub async fn create_pricing_plan(
    state: &AppState,
    submission: &Submission,
) -> Result<PricingPlanResponse, ApiError> {
    save_pricing_plan(state, None, &PricingPlanInput::try_from(submission)?).await
}

pub async fn update_pricing_plan(
    state: &AppState,
    id: &str,
    submission: &Submission,
) -> Result<PricingPlanResponse, ApiError> {
    save_pricing_plan(state, Some(id), &PricingPlanInput::try_from(submission)?).await
}

pub async fn delete_pricing_plan(state: &AppState, id: &str) -> Result<(), ApiError> {
    if !PricingPlan::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Pricing plan not found"));
    }
    tracing::info!(%id, "Pricing plan deleted");
    Ok(())
}
