//! Project form: common fields plus the input set of the selected category.

use serde_json::{Map, Value};

use super::{
    field, DynamicList, FieldKind, FieldSpec, FieldView, FormMode, FormOp, FormState,
    OptionView, PostedFields, Submission, SubmissionError,
};
use crate::db::{Category, Project, ProjectInput, ProjectStatus, ResultMetric, Testimonial};

use FieldKind::*;

const COMMON_FIELDS: &[FieldSpec] = &[
    field("title", "Title", Text),
    field("slug", "Slug (generated from the title when empty)", Text),
    field("description", "Description", LongText),
    field("client", "Client", Text),
    field("year", "Year", Text),
    field("duration", "Duration", Text),
    field("image", "Cover image URL", Url),
    field("images", "Gallery images", List),
    field("technologies", "Technologies", List),
    field("featured", "Featured on the home page", Flag),
];

const CREATIVE_STUDIO_FIELDS: &[FieldSpec] = &[
    field("brandColors", "Brand colors", List),
    field("deliverables", "Deliverables", List),
];

const DIGITAL_DEVELOPMENT_FIELDS: &[FieldSpec] = &[
    field("liveUrl", "Live URL", Url),
    field("challenge", "Challenge", LongText),
    field("solution", "Solution", LongText),
    field("features", "Features", List),
];

const AI_AUTOMATION_FIELDS: &[FieldSpec] = &[
    field("aiModels", "AI models", List),
    field("integrations", "Integrations", List),
    field("automationType", "Automation type", Text),
    field("workflowDescription", "Workflow description", LongText),
];

const DIGITAL_MARKETING_FIELDS: &[FieldSpec] = &[
    field("platforms", "Platforms", List),
    field("budget", "Budget", Text),
    field("targetAudience", "Target audience", Text),
    field("strategy", "Strategy", LongText),
    field("revenue", "Revenue", Text),
    field("adCreatives", "Ad creatives", List),
];

const VISUAL_STORYTELLING_FIELDS: &[FieldSpec] = &[
    field("videoUrl", "Video URL", Url),
    field("shootingStyle", "Shooting style", Text),
    field("location", "Location", Text),
    field("postProduction", "Post production", LongText),
    field("testimonial.quote", "Testimonial quote", LongText),
    field("testimonial.author", "Testimonial author", Text),
    field("testimonial.position", "Testimonial position", Text),
    field("equipment", "Equipment", List),
];

/// Inputs shown for the detail subset of `category`
pub fn category_fields(category: Option<Category>) -> &'static [FieldSpec] {
    match category {
        Some(Category::CreativeStudio) => CREATIVE_STUDIO_FIELDS,
        Some(Category::DigitalDevelopment) => DIGITAL_DEVELOPMENT_FIELDS,
        Some(Category::AiAutomation) => AI_AUTOMATION_FIELDS,
        Some(Category::DigitalMarketing) => DIGITAL_MARKETING_FIELDS,
        Some(Category::VisualStorytelling) => VISUAL_STORYTELLING_FIELDS,
        _ => &[],
    }
}

const TESTIMONIAL_PREFIX: &str = "testimonial.";

/// One editable row of the results list
#[derive(Debug, Clone)]
pub struct ResultRowView {
    pub index: usize,
    pub metric: String,
    pub value: String,
    pub description: String,
    pub change: String,
    pub remove_op: String,
}

#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub mode: FormMode,
    pub category: String,
    pub status: String,
    state: FormState,
    results: DynamicList<ResultMetric>,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Create,
            category: Category::CreativeStudio.as_str().to_string(),
            status: ProjectStatus::Draft.as_str().to_string(),
            state: FormState::default(),
            results: DynamicList::new(),
        }
    }
}

impl ProjectForm {
    /// Blank form in create mode, or a form prefilled from `project` in edit mode
    pub fn for_project(project: Option<&Project>) -> Self {
        let Some(project) = project else {
            return Self::default();
        };

        let response = project.to_response();
        let mut form = Self {
            mode: FormMode::from_initial_id(Some(&project.id)),
            category: project.category.clone(),
            status: project.status.clone(),
            state: FormState::default(),
            results: DynamicList::from_vec(response.results.clone()),
        };

        form.state.set_value("title", &response.title);
        form.state.set_value("slug", &response.slug);
        form.state.set_value("description", &response.description);
        form.state.set_value("client", &response.client);
        form.state.set_value("year", &response.year);
        form.state.set_value("duration", &response.duration);
        form.state.set_value("image", &response.image);
        form.state.set_list("images", response.images.clone());
        form.state.set_list("technologies", response.technologies.clone());
        form.state.set_flag("featured", response.featured);

        for spec in category_fields(form.category_enum()) {
            if let Some(sub) = spec.key.strip_prefix(TESTIMONIAL_PREFIX) {
                let text = response
                    .details
                    .get("testimonial")
                    .and_then(|t| t.get(sub))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                form.state.set_value(spec.key, text);
                continue;
            }
            match (spec.kind, response.details.get(spec.key)) {
                (List, Some(Value::Array(items))) => form.state.set_list(
                    spec.key,
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ),
                (_, Some(Value::String(text))) => form.state.set_value(spec.key, text),
                _ => {}
            }
        }
        form
    }

    /// Rebuild the form from a POST. Inputs outside the selected category are dropped.
    pub fn from_posted(posted: &PostedFields) -> Self {
        let mut form = Self {
            mode: FormMode::from_initial_id(posted.get("id")),
            category: posted
                .get("category")
                .unwrap_or(Category::CreativeStudio.as_str())
                .to_string(),
            status: posted
                .get("status")
                .unwrap_or(ProjectStatus::Draft.as_str())
                .to_string(),
            ..Self::default()
        };
        let specs = form.specs();
        form.state.read_posted(&specs, posted);
        form.results = posted
            .indexed_records("results")
            .into_iter()
            .map(|mut record| ResultMetric {
                metric: record.remove("metric").unwrap_or_default(),
                value: record.remove("value").unwrap_or_default(),
                description: record.remove("description").unwrap_or_default(),
                change: record.remove("change").filter(|c| !c.trim().is_empty()),
            })
            .collect::<Vec<_>>()
            .into();
        form
    }

    pub fn category_enum(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    pub fn specs(&self) -> Vec<FieldSpec> {
        let mut specs = COMMON_FIELDS.to_vec();
        specs.extend_from_slice(category_fields(self.category_enum()));
        specs
    }

    /// Apply a list op. Returns whether the form changed.
    pub fn apply(&mut self, op: &FormOp) -> bool {
        match op {
            FormOp::Add(key) if key == "results" => {
                self.results.append();
                true
            }
            FormOp::Remove(key, index) if key == "results" => self.results.remove(*index).is_some(),
            op => self.state.apply_list_op(&self.specs(), op),
        }
    }

    pub fn results(&self) -> &[ResultMetric] {
        self.results.items()
    }

    pub fn to_submission(&self) -> Submission {
        let mut submission = Submission::new();
        submission.insert("category", self.category.trim());
        submission.insert("status", self.status.trim());

        let specs = self.specs();
        let (testimonial, other): (Vec<FieldSpec>, Vec<FieldSpec>) = specs
            .into_iter()
            .partition(|s| s.key.starts_with(TESTIMONIAL_PREFIX));
        self.state.write_submission(&other, &mut submission);

        if !testimonial.is_empty() {
            let testimonial = Testimonial {
                quote: self.state.value("testimonial.quote").trim().to_string(),
                author: self.state.value("testimonial.author").trim().to_string(),
                position: self.state.value("testimonial.position").trim().to_string(),
            };
            if !testimonial.is_empty() {
                submission.insert_json("testimonial", &testimonial);
            }
        }

        let results: Vec<ResultMetric> = self
            .results
            .items()
            .iter()
            .filter(|r| !r.metric.trim().is_empty() || !r.value.trim().is_empty())
            .cloned()
            .collect();
        submission.insert_json("results", &results);
        submission
    }

    pub fn field_views(&self) -> Vec<FieldView> {
        self.state.views(&self.specs())
    }

    pub fn result_views(&self) -> Vec<ResultRowView> {
        self.results
            .items()
            .iter()
            .enumerate()
            .map(|(index, r)| ResultRowView {
                index,
                metric: r.metric.clone(),
                value: r.value.clone(),
                description: r.description.clone(),
                change: r.change.clone().unwrap_or_default(),
                remove_op: format!("remove:results:{}", index),
            })
            .collect()
    }

    /// Category choices: the current categories, plus a legacy one when editing such a record
    pub fn category_options(&self) -> Vec<OptionView> {
        let mut categories = Category::CURRENT.to_vec();
        if let Some(current) = self.category_enum().filter(Category::is_legacy) {
            categories.push(current);
        }
        categories
            .into_iter()
            .map(|c| OptionView {
                value: c.as_str().to_string(),
                label: c.label().to_string(),
                selected: c.as_str() == self.category,
            })
            .collect()
    }

    pub fn status_options(&self) -> Vec<OptionView> {
        ProjectStatus::ALL
            .iter()
            .map(|s| OptionView {
                value: s.as_str().to_string(),
                label: s.as_str().to_string(),
                selected: s.as_str() == self.status,
            })
            .collect()
    }
}

impl TryFrom<&Submission> for ProjectInput {
    type Error = SubmissionError;

    fn try_from(submission: &Submission) -> Result<Self, Self::Error> {
        let category = submission.text("category");
        let mut details = Map::new();

        for spec in category_fields(category.parse().ok()) {
            if spec.key.starts_with(TESTIMONIAL_PREFIX) {
                continue;
            }
            match spec.kind {
                List => {
                    let items: Vec<String> = submission.json(spec.key)?;
                    details.insert(spec.key.to_string(), Value::from(items));
                }
                _ => {
                    if let Some(text) = submission.optional_text(spec.key) {
                        details.insert(spec.key.to_string(), Value::String(text));
                    }
                }
            }
        }
        if let Some(testimonial) = submission.json::<Option<Testimonial>>("testimonial")? {
            details.insert(
                "testimonial".to_string(),
                serde_json::to_value(testimonial).unwrap_or(Value::Null),
            );
        }

        Ok(ProjectInput {
            title: submission.text("title"),
            slug: submission.text("slug"),
            category,
            description: submission.text("description"),
            client: submission.text("client"),
            year: submission.text("year"),
            duration: submission.text("duration"),
            image: submission.text("image"),
            images: submission.json("images")?,
            technologies: submission.json("technologies")?,
            status: submission.optional_text("status"),
            featured: submission.flag("featured"),
            results: submission.json("results")?,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posted(pairs: &[(&str, &str)]) -> PostedFields {
        PostedFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_new_form_is_create_mode() {
        let form = ProjectForm::for_project(None);
        assert_eq!(form.mode, FormMode::Create);
        assert_eq!(form.category, "creative-studio");
        assert_eq!(form.mode.submit_label(), "Create");
    }

    #[test]
    fn test_fields_follow_selected_category() {
        let form = ProjectForm::from_posted(&posted(&[("category", "ai-automation")]));
        let keys: Vec<&str> = form.specs().iter().map(|s| s.key).collect();
        assert!(keys.contains(&"aiModels"));
        assert!(!keys.contains(&"liveUrl"));

        let legacy = ProjectForm::from_posted(&posted(&[("category", "paid-ads")]));
        assert_eq!(legacy.specs().len(), COMMON_FIELDS.len());
    }

    #[test]
    fn test_add_and_remove_feature_rows() {
        let mut form = ProjectForm::from_posted(&posted(&[
            ("category", "digital-development"),
            ("features.0", "Checkout"),
            ("features.1", "Search"),
        ]));
        assert!(form.apply(&FormOp::Add("features".into())));
        assert!(form.apply(&FormOp::Remove("features".into(), 0)));

        let views = form.field_views();
        let features = views.iter().find(|v| v.key == "features").unwrap();
        let values: Vec<&str> = features.items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["Search", ""]);
        assert_eq!(features.items[1].remove_op, "remove:features:1");
    }

    #[test]
    fn test_results_rows_are_edited_by_index() {
        let mut form = ProjectForm::from_posted(&posted(&[
            ("category", "digital-marketing"),
            ("results.0.metric", "ROAS"),
            ("results.0.value", "4x"),
        ]));
        form.apply(&FormOp::Add("results".into()));
        assert_eq!(form.results().len(), 2);
        form.apply(&FormOp::Remove("results".into(), 0));
        assert_eq!(form.results(), &[ResultMetric::default()]);
    }

    #[test]
    fn test_submission_decodes_into_category_subset() {
        let form = ProjectForm::from_posted(&posted(&[
            ("id", "p-1"),
            ("category", "visual-storytelling"),
            ("status", "published"),
            ("title", "  Short film "),
            ("featured", "on"),
            ("equipment.0", "RED Komodo"),
            ("equipment.1", "   "),
            ("testimonial.quote", "Stunning work"),
            ("testimonial.author", "Ama"),
            ("features.0", "not part of this category"),
            ("results.0.metric", "Views"),
            ("results.0.value", "1M"),
            ("results.1.metric", ""),
        ]));
        assert_eq!(form.mode, FormMode::Edit { id: "p-1".into() });

        let submission = form.to_submission();
        assert_eq!(submission.get("equipment"), Some(r#"["RED Komodo"]"#));

        let input = ProjectInput::try_from(&submission).unwrap();
        assert_eq!(input.title, "Short film");
        assert_eq!(input.status.as_deref(), Some("published"));
        assert!(input.featured);
        assert_eq!(input.results.len(), 1);
        assert!(input.details.get("features").is_none());
        assert_eq!(input.details["testimonial"]["author"], "Ama");
    }

    #[test]
    fn test_malformed_list_json_is_reported_by_field() {
        let mut submission = Submission::new();
        submission.insert("category", "creative-studio");
        submission.insert("deliverables", "{oops");
        let err = ProjectInput::try_from(&submission).unwrap_err();
        assert_eq!(err.field(), "deliverables");
    }

    #[test]
    fn test_legacy_record_keeps_its_category_option() {
        let form = ProjectForm::from_posted(&posted(&[("id", "x"), ("category", "social-media")]));
        let options = form.category_options();
        assert_eq!(options.len(), Category::CURRENT.len() + 1);
        assert!(options.last().unwrap().selected);
    }
}
