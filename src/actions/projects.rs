use serde_json::Value;

use super::compact;
use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{validate_optional_url, validate_required, validate_slug};
use crate::db::{
    slugify, Category, Project, ProjectDetails, ProjectFields, ProjectFilter, ProjectInput,
    ProjectResponse, ProjectStatus,
};
use crate::forms::Submission;
use crate::AppState;

pub async fn get_projects(
    state: &AppState,
    filter: &ProjectFilter,
) -> Result<Vec<ProjectResponse>, ApiError> {
    let projects = Project::list(&state.db, filter).await?;
    Ok(projects.iter().map(Project::to_response).collect())
}

/// Check a project input and turn it into the columns to write.
///
/// Only the detail subset of the chosen category is kept.
pub fn validate_project(input: &ProjectInput) -> Result<ProjectFields, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("title", validate_required(&input.title, "Title", 200));

    let slug = match input.slug.trim() {
        "" => slugify(&input.title),
        slug => slug.to_string(),
    };
    errors.check("slug", validate_slug(&slug));

    let category = match input.category.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            errors.add("category", e.to_string());
            None
        }
    };

    let status = match input.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => ProjectStatus::Draft,
        Some(status) => status.parse().unwrap_or_else(|e: String| {
            errors.add("status", e);
            ProjectStatus::Draft
        }),
    };

    errors.check("image", validate_optional_url(&input.image));
    let images = compact(&input.images);
    for image in &images {
        errors.check("images", validate_optional_url(image));
    }

    let details = category.map(|category| {
        ProjectDetails::parse(category, &Value::Object(input.details.clone()))
    });
    match &details {
        Some(Ok(ProjectDetails::DigitalDevelopment(d))) => {
            errors.check("liveUrl", validate_optional_url(d.live_url.as_deref().unwrap_or_default()));
        }
        Some(Ok(ProjectDetails::VisualStorytelling(d))) => {
            errors.check("videoUrl", validate_optional_url(d.video_url.as_deref().unwrap_or_default()));
        }
        Some(Err(e)) => {
            errors.add("details", e.to_string());
        }
        _ => {}
    }

    errors.finish()?;

    // Both are present once validation passed
    let (Some(category), Some(Ok(details))) = (category, details) else {
        return Err(ApiError::internal("Project validation failed"));
    };

    let results = input
        .results
        .iter()
        .filter(|r| !r.metric.trim().is_empty() || !r.value.trim().is_empty())
        .cloned()
        .collect();

    Ok(ProjectFields {
        title: input.title.trim().to_string(),
        slug,
        category,
        description: input.description.trim().to_string(),
        client: input.client.trim().to_string(),
        year: input.year.trim().to_string(),
        duration: input.duration.trim().to_string(),
        image: input.image.trim().to_string(),
        images,
        technologies: compact(&input.technologies),
        status,
        featured: input.featured,
        details: compact_details(details),
        results,
    })
}

/// Drop blank entries from the list fields of a detail subset
fn compact_details(details: ProjectDetails) -> ProjectDetails {
    match details {
        ProjectDetails::CreativeStudio(mut d) => {
            d.brand_colors = compact(&d.brand_colors);
            d.deliverables = compact(&d.deliverables);
            ProjectDetails::CreativeStudio(d)
        }
        ProjectDetails::DigitalDevelopment(mut d) => {
            d.features = compact(&d.features);
            ProjectDetails::DigitalDevelopment(d)
        }
        ProjectDetails::AiAutomation(mut d) => {
            d.ai_models = compact(&d.ai_models);
            d.integrations = compact(&d.integrations);
            ProjectDetails::AiAutomation(d)
        }
        ProjectDetails::DigitalMarketing(mut d) => {
            d.platforms = compact(&d.platforms);
            d.ad_creatives = compact(&d.ad_creatives);
            ProjectDetails::DigitalMarketing(d)
        }
        ProjectDetails::VisualStorytelling(mut d) => {
            d.equipment = compact(&d.equipment);
            d.testimonial = d.testimonial.filter(|t| !t.is_empty());
            ProjectDetails::VisualStorytelling(d)
        }
        legacy => legacy,
    }
}

/// Create (`id` is `None`) or replace a project from a typed input
pub async fn save_project(
    state: &AppState,
    id: Option<&str>,
    input: &ProjectInput,
) -> Result<ProjectResponse, ApiError> {
    let fields = validate_project(input)?;

    let project = match id {
        None => Project::create(&state.db, &fields).await?,
        Some(id) => Project::update(&state.db, id, &fields)
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))?,
    };

    tracing::info!(
        id = %project.id,
        slug = %project.slug,
        category = %project.category,
        status = %project.status,
        "Project saved"
    );
    Ok(project.to_response())
}

pub async fn create_project(
    state: &AppState,
    submission: &Submission,
) -> Result<ProjectResponse, ApiError> {
    let input = ProjectInput::try_from(submission)?;
    save_project(state, None, &input).await
}

pub async fn update_project(
    state: &AppState,
    id: &str,
    submission: &Submission,
) -> Result<ProjectResponse, ApiError> {
    let input = ProjectInput::try_from(submission)?;
    save_project(state, Some(id), &input).await
}

pub async fn delete_project(state: &AppState, id: &str) -> Result<(), ApiError> {
    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    tracing::info!(%id, "Project deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::test_state;
    use serde_json::json;

    fn input(value: Value) -> ProjectInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_derives_slug_and_defaults_to_draft() {
        let fields = validate_project(&input(json!({
            "title": "Brand Refresh 2024",
            "category": "creative-studio",
            "brandColors": ["#111", " "],
            "features": ["belongs to another category"]
        })))
        .unwrap();
        assert_eq!(fields.slug, "brand-refresh-2024");
        assert_eq!(fields.status, ProjectStatus::Draft);
        let details = fields.details.to_map();
        assert_eq!(details["brandColors"], json!(["#111"]));
        assert!(details.get("features").is_none());
    }

    #[test]
    fn test_validate_collects_field_errors() {
        let err = validate_project(&input(json!({
            "title": "",
            "category": "pottery",
            "status": "deleted",
            "image": "ftp://nope"
        })))
        .unwrap_err();
        let errors = err.field_errors();
        for field in ["title", "category", "status", "image"] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_validate_rejects_mistyped_details() {
        let err = validate_project(&input(json!({
            "title": "App",
            "category": "digital-development",
            "features": "Checkout"
        })))
        .unwrap_err();
        assert!(err.field_errors().contains_key("details"));
    }

    #[tokio::test]
    async fn test_create_update_delete_from_submissions() {
        let state = test_state().await;

        let mut submission = Submission::new();
        submission.insert("title", "Automation Suite");
        submission.insert("category", "ai-automation");
        submission.insert("aiModels", r#"["gpt-4o"]"#);
        let created = create_project(&state, &submission).await.unwrap();
        assert_eq!(created.slug, "automation-suite");
        assert_eq!(created.status, "draft");
        assert_eq!(created.details["aiModels"], json!(["gpt-4o"]));

        submission.insert("status", "published");
        let updated = update_project(&state, &created.id, &submission).await.unwrap();
        assert_eq!(updated.status, "published");

        let published = get_projects(&state, &ProjectFilter::published()).await.unwrap();
        assert_eq!(published.len(), 1);

        delete_project(&state, &created.id).await.unwrap();
        let err = delete_project(&state, &created.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_a_conflict() {
        let state = test_state().await;
        let mut submission = Submission::new();
        submission.insert("title", "Same Title");
        submission.insert("category", "creative-studio");
        create_project(&state, &submission).await.unwrap();

        let err = create_project(&state, &submission).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_update_missing_project_is_not_found() {
        let state = test_state().await;
        let mut submission = Submission::new();
        submission.insert("title", "Ghost");
        submission.insert("category", "creative-studio");
        let err = update_project(&state, "missing", &submission).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
