//! Blog, pricing plan and site settings forms.

use super::{
    field, FieldKind, FieldSpec, FieldView, FormMode, FormOp, FormState, PostedFields,
    Submission, SubmissionError,
};
use crate::db::{Blog, BlogInput, PricingPlan, PricingPlanInput, PricingPlanResponse, SiteSettings};

use FieldKind::*;

const BLOG_FIELDS: &[FieldSpec] = &[
    field("title", "Title", Text),
    field("slug", "Slug (generated from the title when empty)", Text),
    field("category", "Category", Text),
    field("author", "Author", Text),
    field("image", "Cover image URL", Url),
    field("publicationDate", "Publication date", Date),
    field("excerpt", "Excerpt", LongText),
    field("text", "Body (HTML)", Html),
];

const PRICING_FIELDS: &[FieldSpec] = &[
    field("name", "Name", Text),
    field("tagline", "Tagline", Text),
    field("price", "Price", Number),
    field("currency", "Currency", Text),
    field("period", "Billing period", Text),
    field("features", "Features", List),
    field("popular", "Most popular", Flag),
    field("isCustom", "Custom quote", Flag),
    field("category", "Service category", Text),
    field("pages", "Pages", Text),
    field("duration", "Duration", Text),
    field("platforms", "Platforms", List),
];

const SETTINGS_FIELDS: &[FieldSpec] = &[
    field("siteName", "Site name", Text),
    field("tagline", "Tagline", Text),
    field("contactEmail", "Contact email", Text),
    field("contactPhone", "Contact phone", Text),
    field("address", "Address", LongText),
    field("instagram", "Instagram", Url),
    field("linkedin", "LinkedIn", Url),
    field("behance", "Behance", Url),
    field("twitter", "Twitter", Url),
];

/// A form over a fixed field set
macro_rules! fixed_form {
    ($name:ident, $specs:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub mode: FormMode,
            state: FormState,
        }

        impl $name {
            pub fn from_posted(posted: &PostedFields) -> Self {
                let mut state = FormState::default();
                state.read_posted($specs, posted);
                Self {
                    mode: FormMode::from_initial_id(posted.get("id")),
                    state,
                }
            }

            pub fn apply(&mut self, op: &FormOp) -> bool {
                self.state.apply_list_op($specs, op)
            }

            pub fn to_submission(&self) -> Submission {
                let mut submission = Submission::new();
                self.state.write_submission($specs, &mut submission);
                submission
            }

            pub fn field_views(&self) -> Vec<FieldView> {
                self.state.views($specs)
            }
        }
    };
}

fixed_form!(BlogForm, BLOG_FIELDS);
fixed_form!(PricingForm, PRICING_FIELDS);
fixed_form!(SettingsForm, SETTINGS_FIELDS);

impl BlogForm {
    pub fn for_blog(blog: Option<&Blog>) -> Self {
        let mut state = FormState::default();
        let mode = match blog {
            None => FormMode::Create,
            Some(blog) => {
                state.set_value("title", &blog.title);
                state.set_value("slug", &blog.slug);
                state.set_value("category", &blog.category);
                state.set_value("author", &blog.author);
                state.set_value("image", &blog.image);
                state.set_value("publicationDate", &blog.publication_date);
                state.set_value("excerpt", &blog.excerpt);
                state.set_value("text", &blog.text);
                FormMode::from_initial_id(Some(&blog.id))
            }
        };
        Self { mode, state }
    }
}

impl PricingForm {
    pub fn for_plan(plan: Option<&PricingPlan>) -> Self {
        let mut state = FormState::default();
        let mode = match plan {
            None => {
                state.set_value("currency", "USD");
                FormMode::Create
            }
            Some(plan) => {
                let plan = PricingPlanResponse::from(plan.clone());
                state.set_value("name", &plan.name);
                state.set_value("tagline", &plan.tagline);
                state.set_value("price", plan.price.to_string());
                state.set_value("currency", &plan.currency);
                state.set_value("period", &plan.period);
                state.set_list("features", plan.features.clone());
                state.set_flag("popular", plan.popular);
                state.set_flag("isCustom", plan.is_custom);
                state.set_value("category", plan.category.clone().unwrap_or_default());
                state.set_value("pages", plan.pages.clone().unwrap_or_default());
                state.set_value("duration", plan.duration.clone().unwrap_or_default());
                state.set_list("platforms", plan.platforms.clone());
                FormMode::from_initial_id(Some(&plan.id))
            }
        };
        Self { mode, state }
    }
}

impl SettingsForm {
    /// Settings always exist, so the form is always in edit mode
    pub fn for_settings(settings: &SiteSettings) -> Self {
        let mut state = FormState::default();
        state.set_value("siteName", &settings.site_name);
        state.set_value("tagline", &settings.tagline);
        state.set_value("contactEmail", &settings.contact_email);
        state.set_value("contactPhone", &settings.contact_phone);
        state.set_value("address", &settings.address);
        state.set_value("instagram", &settings.instagram);
        state.set_value("linkedin", &settings.linkedin);
        state.set_value("behance", &settings.behance);
        state.set_value("twitter", &settings.twitter);
        Self {
            mode: FormMode::Edit {
                id: "site".to_string(),
            },
            state,
        }
    }
}

impl TryFrom<&Submission> for BlogInput {
    type Error = SubmissionError;

    fn try_from(submission: &Submission) -> Result<Self, Self::Error> {
        Ok(BlogInput {
            title: submission.text("title"),
            slug: submission.text("slug"),
            category: submission.text("category"),
            author: submission.text("author"),
            image: submission.text("image"),
            text: submission.text("text"),
            excerpt: submission.text("excerpt"),
            publication_date: submission.text("publicationDate"),
        })
    }
}

impl TryFrom<&Submission> for PricingPlanInput {
    type Error = SubmissionError;

    fn try_from(submission: &Submission) -> Result<Self, Self::Error> {
        Ok(PricingPlanInput {
            name: submission.text("name"),
            tagline: submission.text("tagline"),
            price: submission.number("price")?,
            currency: submission.text("currency"),
            period: submission.text("period"),
            features: submission.json("features")?,
            popular: submission.flag("popular"),
            is_custom: submission.flag("isCustom"),
            category: submission.optional_text("category"),
            pages: submission.optional_text("pages"),
            duration: submission.optional_text("duration"),
            platforms: submission.json("platforms")?,
        })
    }
}

impl TryFrom<&Submission> for SiteSettings {
    type Error = SubmissionError;

    fn try_from(submission: &Submission) -> Result<Self, Self::Error> {
        Ok(SiteSettings {
            site_name: submission.text("siteName"),
            tagline: submission.text("tagline"),
            contact_email: submission.text("contactEmail"),
            contact_phone: submission.text("contactPhone"),
            address: submission.text("address"),
            instagram: submission.text("instagram"),
            linkedin: submission.text("linkedin"),
            behance: submission.text("behance"),
            twitter: submission.text("twitter"),
        })
    }
}
