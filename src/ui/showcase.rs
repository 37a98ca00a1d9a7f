//! Project detail pages: one showcase template per category.
//!
//! A project's stored details are checked against its category's shape
//! before a template is chosen. Unknown categories and details that do not
//! fit fall back to the generic showcase.

use askama::Template;
use std::sync::Arc;

use super::templates::{
    AiAutomationShowcase, CreativeStudioShowcase, DigitalDevelopmentShowcase,
    DigitalMarketingShowcase, GenericShowcase, LegacyShowcase, ProjectView,
    VisualStorytellingShowcase,
};
use crate::db::{
    AiAutomationDetails, Category, CreativeStudioDetails, DigitalDevelopmentDetails,
    DigitalMarketingDetails, Project, ProjectDetails, SiteSettings, VisualStorytellingDetails,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Showcase {
    CreativeStudio(CreativeStudioDetails),
    DigitalDevelopment(DigitalDevelopmentDetails),
    AiAutomation(AiAutomationDetails),
    DigitalMarketing(DigitalMarketingDetails),
    VisualStorytelling(VisualStorytellingDetails),
    /// Shared by the legacy categories
    Legacy(Category),
    Generic,
}

impl Showcase {
    pub fn for_project(project: &Project) -> Self {
        match project.typed_details() {
            Ok(ProjectDetails::CreativeStudio(d)) => Self::CreativeStudio(d),
            Ok(ProjectDetails::DigitalDevelopment(d)) => Self::DigitalDevelopment(d),
            Ok(ProjectDetails::AiAutomation(d)) => Self::AiAutomation(d),
            Ok(ProjectDetails::DigitalMarketing(d)) => Self::DigitalMarketing(d),
            Ok(ProjectDetails::VisualStorytelling(d)) => Self::VisualStorytelling(d),
            Ok(ProjectDetails::Legacy(category)) => Self::Legacy(category),
            Err(e) => {
                tracing::warn!(
                    slug = %project.slug,
                    category = %project.category,
                    error = %e,
                    "Showing project with the generic template"
                );
                Self::Generic
            }
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            Self::CreativeStudio(_) => "creative-studio",
            Self::DigitalDevelopment(_) => "digital-development",
            Self::AiAutomation(_) => "ai-automation",
            Self::DigitalMarketing(_) => "digital-marketing",
            Self::VisualStorytelling(_) => "visual-storytelling",
            Self::Legacy(_) => "legacy",
            Self::Generic => "generic",
        }
    }

    pub fn render(self, site: Arc<SiteSettings>, project: &Project) -> askama::Result<String> {
        let project = ProjectView::from(project);
        match self {
            Self::CreativeStudio(details) => CreativeStudioShowcase { site, project, details }.render(),
            Self::DigitalDevelopment(details) => {
                DigitalDevelopmentShowcase { site, project, details }.render()
            }
            Self::AiAutomation(details) => AiAutomationShowcase { site, project, details }.render(),
            Self::DigitalMarketing(details) => {
                DigitalMarketingShowcase { site, project, details }.render()
            }
            Self::VisualStorytelling(details) => {
                VisualStorytellingShowcase { site, project, details }.render()
            }
            Self::Legacy(_) => LegacyShowcase { site, project }.render(),
            Self::Generic => GenericShowcase { site, project }.render(),
        }
    }
}
