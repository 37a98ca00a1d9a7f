use std::sync::Arc;

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{validate_email, validate_optional_url, validate_phone, validate_required};
use crate::db::SiteSettings;
use crate::forms::Submission;
use crate::AppState;

/// Settings as last saved; served from memory
pub fn get_settings(state: &AppState) -> Arc<SiteSettings> {
    state.settings()
}

/// Validate, persist and publish new settings
pub async fn save_settings(state: &AppState, settings: &SiteSettings) -> Result<Arc<SiteSettings>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("siteName", validate_required(&settings.site_name, "Site name", 80));
    errors.check("contactEmail", validate_email(&settings.contact_email));
    errors.check("contactPhone", validate_phone(&settings.contact_phone));
    for (field, url) in [
        ("instagram", &settings.instagram),
        ("linkedin", &settings.linkedin),
        ("behance", &settings.behance),
        ("twitter", &settings.twitter),
    ] {
        errors.check(field, validate_optional_url(url));
    }
    errors.finish()?;

    let settings = SiteSettings {
        site_name: settings.site_name.trim().to_string(),
        contact_email: settings.contact_email.trim().to_string(),
        ..settings.clone()
    };
    settings.save(&state.db).await?;

    let settings = Arc::new(settings);
    state.settings.store(Arc::clone(&settings));
    tracing::info!(site_name = %settings.site_name, "Site settings updated");
    Ok(settings)
}

pub async fn update_settings(
    state: &AppState,
    submission: &Submission,
) -> Result<Arc<SiteSettings>, ApiError> {
    save_settings(state, &SiteSettings::try_from(submission)?).await
}
