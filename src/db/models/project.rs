//! Project models: the category tag, per-category detail shapes and queries.
//!
//! The category column decides which optional-field subset a project carries.
//! That subset is stored as a JSON object in `details` and is only ever read
//! back through [`ProjectDetails::parse`], which checks it against the typed
//! shape of the category.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, SqlitePool};

use super::common::{now, parse_json_list, serialize_json_list, ProjectStatus};

/// Category tag of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CreativeStudio,
    DigitalDevelopment,
    AiAutomation,
    DigitalMarketing,
    VisualStorytelling,
    #[serde(alias = "web-dev")]
    WebDevelopment,
    PaidAds,
    SocialMedia,
}

impl Category {
    /// Categories offered by the dashboard form
    pub const CURRENT: [Category; 5] = [
        Self::CreativeStudio,
        Self::DigitalDevelopment,
        Self::AiAutomation,
        Self::DigitalMarketing,
        Self::VisualStorytelling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreativeStudio => "creative-studio",
            Self::DigitalDevelopment => "digital-development",
            Self::AiAutomation => "ai-automation",
            Self::DigitalMarketing => "digital-marketing",
            Self::VisualStorytelling => "visual-storytelling",
            Self::WebDevelopment => "web-development",
            Self::PaidAds => "paid-ads",
            Self::SocialMedia => "social-media",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CreativeStudio => "Creative Studio",
            Self::DigitalDevelopment => "Digital Development",
            Self::AiAutomation => "AI Automation",
            Self::DigitalMarketing => "Digital Marketing",
            Self::VisualStorytelling => "Visual Storytelling",
            Self::WebDevelopment => "Web Development",
            Self::PaidAds => "Paid Ads",
            Self::SocialMedia => "Social Media",
        }
    }

    /// Categories kept readable for older records; they carry no detail fields
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::WebDevelopment | Self::PaidAds | Self::SocialMedia
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "creative-studio" => Ok(Self::CreativeStudio),
            "digital-development" => Ok(Self::DigitalDevelopment),
            "ai-automation" => Ok(Self::AiAutomation),
            "digital-marketing" => Ok(Self::DigitalMarketing),
            "visual-storytelling" => Ok(Self::VisualStorytelling),
            "web-development" | "web-dev" => Ok(Self::WebDevelopment),
            "paid-ads" => Ok(Self::PaidAds),
            "social-media" => Ok(Self::SocialMedia),
            other => Err(ShapeError::UnknownCategory(other.to_string())),
        }
    }
}

/// Why a stored project cannot be shown with its category's template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("unknown project category '{0}'")]
    UnknownCategory(String),
    #[error("{category} details do not match the category shape: {reason}")]
    Mismatch { category: Category, reason: String },
}

/// A headline number shown in a case study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetric {
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub position: String,
}

impl Testimonial {
    pub fn is_empty(&self) -> bool {
        self.quote.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreativeStudioDetails {
    pub brand_colors: Vec<String>,
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalDevelopmentDetails {
    pub live_url: Option<String>,
    pub challenge: Option<String>,
    pub solution: Option<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiAutomationDetails {
    pub ai_models: Vec<String>,
    pub integrations: Vec<String>,
    pub automation_type: Option<String>,
    pub workflow_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalMarketingDetails {
    pub platforms: Vec<String>,
    pub budget: Option<String>,
    pub target_audience: Option<String>,
    pub strategy: Option<String>,
    pub revenue: Option<String>,
    pub ad_creatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualStorytellingDetails {
    pub video_url: Option<String>,
    pub shooting_style: Option<String>,
    pub location: Option<String>,
    pub post_production: Option<String>,
    pub testimonial: Option<Testimonial>,
    pub equipment: Vec<String>,
}

/// Category-specific fields of a project, discriminated by its category
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectDetails {
    CreativeStudio(CreativeStudioDetails),
    DigitalDevelopment(DigitalDevelopmentDetails),
    AiAutomation(AiAutomationDetails),
    DigitalMarketing(DigitalMarketingDetails),
    VisualStorytelling(VisualStorytellingDetails),
    /// Legacy categories have no detail fields
    Legacy(Category),
}

impl ProjectDetails {
    /// Check a details object against the shape of `category`.
    ///
    /// Keys outside the category's subset are ignored. A key of the subset
    /// holding the wrong JSON type is a mismatch.
    pub fn parse(category: Category, value: &Value) -> Result<Self, ShapeError> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            v => v.clone(),
        };
        let mismatch = |e: serde_json::Error| ShapeError::Mismatch {
            category,
            reason: e.to_string(),
        };

        let details = match category {
            Category::CreativeStudio => {
                Self::CreativeStudio(serde_json::from_value(value).map_err(mismatch)?)
            }
            Category::DigitalDevelopment => {
                Self::DigitalDevelopment(serde_json::from_value(value).map_err(mismatch)?)
            }
            Category::AiAutomation => {
                Self::AiAutomation(serde_json::from_value(value).map_err(mismatch)?)
            }
            Category::DigitalMarketing => {
                Self::DigitalMarketing(serde_json::from_value(value).map_err(mismatch)?)
            }
            Category::VisualStorytelling => {
                Self::VisualStorytelling(serde_json::from_value(value).map_err(mismatch)?)
            }
            legacy => {
                if !value.is_object() {
                    return Err(mismatch(serde::de::Error::custom(
                        "details must be a JSON object",
                    )));
                }
                Self::Legacy(legacy)
            }
        };
        Ok(details)
    }

    pub fn category(&self) -> Category {
        match self {
            Self::CreativeStudio(_) => Category::CreativeStudio,
            Self::DigitalDevelopment(_) => Category::DigitalDevelopment,
            Self::AiAutomation(_) => Category::AiAutomation,
            Self::DigitalMarketing(_) => Category::DigitalMarketing,
            Self::VisualStorytelling(_) => Category::VisualStorytelling,
            Self::Legacy(category) => *category,
        }
    }

    /// The detail fields as a JSON object, only the active subset
    pub fn to_map(&self) -> Map<String, Value> {
        let value = match self {
            Self::CreativeStudio(d) => serde_json::to_value(d),
            Self::DigitalDevelopment(d) => serde_json::to_value(d),
            Self::AiAutomation(d) => serde_json::to_value(d),
            Self::DigitalMarketing(d) => serde_json::to_value(d),
            Self::VisualStorytelling(d) => serde_json::to_value(d),
            Self::Legacy(_) => Ok(Value::Object(Map::new())),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub description: String,
    pub client: String,
    pub year: String,
    pub duration: String,
    pub image: String,
    /// JSON array of gallery image URLs
    pub images: String,
    /// JSON array
    pub technologies: String,
    pub status: String,
    pub featured: i64,
    /// JSON object, see [`ProjectDetails`]
    pub details: String,
    /// JSON array of [`ResultMetric`]
    pub results: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn category_enum(&self) -> Result<Category, ShapeError> {
        self.category.parse()
    }

    /// Parse the stored details against the project's category
    pub fn typed_details(&self) -> Result<ProjectDetails, ShapeError> {
        let category = self.category_enum()?;
        let value: Value = serde_json::from_str(&self.details).map_err(|e| ShapeError::Mismatch {
            category,
            reason: e.to_string(),
        })?;
        ProjectDetails::parse(category, &value)
    }

    pub fn status_enum(&self) -> ProjectStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn is_published(&self) -> bool {
        self.status_enum() == ProjectStatus::Published
    }

    pub fn images_list(&self) -> Vec<String> {
        parse_json_list(&self.images)
    }

    pub fn technologies_list(&self) -> Vec<String> {
        parse_json_list(&self.technologies)
    }

    pub fn results_list(&self) -> Vec<ResultMetric> {
        parse_json_list(&self.results)
    }

    pub fn to_response(&self) -> ProjectResponse {
        let details = match self.typed_details() {
            Ok(details) => details.to_map(),
            Err(e) => {
                tracing::warn!(slug = %self.slug, error = %e, "Dropping project details that do not match the category");
                Map::new()
            }
        };

        ProjectResponse {
            id: self.id.clone(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            client: self.client.clone(),
            year: self.year.clone(),
            duration: self.duration.clone(),
            image: self.image.clone(),
            images: self.images_list(),
            technologies: self.technologies_list(),
            status: self.status.clone(),
            featured: self.featured != 0,
            results: self.results_list(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            details,
        }
    }
}

/// Project as exposed by the API: common fields plus the flattened category subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub results: Vec<ResultMetric>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Request body for creating or replacing a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub results: Vec<ResultMetric>,
    /// Every other key; checked against the category shape on save
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Validated column values written by create/update
#[derive(Debug, Clone)]
pub struct ProjectFields {
    pub title: String,
    pub slug: String,
    pub category: Category,
    pub description: String,
    pub client: String,
    pub year: String,
    pub duration: String,
    pub image: String,
    pub images: Vec<String>,
    pub technologies: Vec<String>,
    pub status: ProjectStatus,
    pub featured: bool,
    pub details: ProjectDetails,
    pub results: Vec<ResultMetric>,
}

/// Filter for project listings
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub published_only: bool,
    pub limit: Option<i64>,
}

impl ProjectFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    /// Category filter value from a query parameter. Known categories and
    /// their aliases map to the stored form; blank values mean no filter.
    pub fn category_param(raw: Option<&str>) -> Option<String> {
        let raw = raw.map(str::trim).filter(|c| !c.is_empty())?;
        Some(match raw.parse::<Category>() {
            Ok(category) => category.as_str().to_string(),
            Err(_) => raw.to_string(),
        })
    }
}

impl Project {
    pub async fn list(db: &SqlitePool, filter: &ProjectFilter) -> Result<Vec<Project>, sqlx::Error> {
        let featured = filter.featured.map(|f| if f { 1i64 } else { 0i64 });
        sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE (? IS NULL OR category = ?)
              AND (? IS NULL OR featured = ?)
              AND (? = 0 OR status = 'published')
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(&filter.category)
        .bind(&filter.category)
        .bind(featured)
        .bind(featured)
        .bind(filter.published_only)
        .bind(filter.limit.unwrap_or(-1))
        .fetch_all(db)
        .await
    }

    pub async fn get_by_id(db: &SqlitePool, id: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn get_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE slug = ?")
            .bind(slug)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &SqlitePool, fields: &ProjectFields) -> Result<Project, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();

        sqlx::query(
            r#"
            INSERT INTO projects (id, title, slug, category, description, client, year, duration,
                image, images, technologies, status, featured, details, results, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(fields.category.as_str())
        .bind(&fields.description)
        .bind(&fields.client)
        .bind(&fields.year)
        .bind(&fields.duration)
        .bind(&fields.image)
        .bind(serialize_json_list(&fields.images))
        .bind(serialize_json_list(&fields.technologies))
        .bind(fields.status.as_str())
        .bind(fields.featured as i64)
        .bind(Value::Object(fields.details.to_map()).to_string())
        .bind(serialize_json_list(&fields.results))
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(&id)
            .fetch_one(db)
            .await
    }

    /// Replace every column of an existing project. Returns `None` if it does not exist.
    pub async fn update(
        db: &SqlitePool,
        id: &str,
        fields: &ProjectFields,
    ) -> Result<Option<Project>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                title = ?, slug = ?, category = ?, description = ?, client = ?, year = ?,
                duration = ?, image = ?, images = ?, technologies = ?, status = ?, featured = ?,
                details = ?, results = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(fields.category.as_str())
        .bind(&fields.description)
        .bind(&fields.client)
        .bind(&fields.year)
        .bind(&fields.duration)
        .bind(&fields.image)
        .bind(serialize_json_list(&fields.images))
        .bind(serialize_json_list(&fields.technologies))
        .bind(fields.status.as_str())
        .bind(fields.featured as i64)
        .bind(Value::Object(fields.details.to_map()).to_string())
        .bind(serialize_json_list(&fields.results))
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
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status(db: &SqlitePool, status: ProjectStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_round_trips_through_strings() {
        for category in Category::CURRENT {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("web-dev".parse::<Category>().unwrap(), Category::WebDevelopment);
        assert!(matches!(
            "pottery".parse::<Category>(),
            Err(ShapeError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_category_param_uses_stored_form() {
        assert_eq!(
            ProjectFilter::category_param(Some("web-dev")).as_deref(),
            Some("web-development")
        );
        assert_eq!(
            ProjectFilter::category_param(Some(" ai-automation ")).as_deref(),
            Some("ai-automation")
        );
        assert_eq!(ProjectFilter::category_param(Some("pottery")).as_deref(), Some("pottery"));
        assert_eq!(ProjectFilter::category_param(Some("  ")), None);
        assert_eq!(ProjectFilter::category_param(None), None);
    }

    #[test]
    fn test_category_serde_uses_kebab_case() {
        let value = serde_json::to_value(Category::AiAutomation).unwrap();
        assert_eq!(value, json!("ai-automation"));
        let parsed: Category = serde_json::from_value(json!("web-dev")).unwrap();
        assert_eq!(parsed, Category::WebDevelopment);
    }

    #[test]
    fn test_parse_ignores_fields_of_other_categories() {
        let value = json!({
            "liveUrl": "https://example.com",
            "features": ["Checkout"],
            "aiModels": ["gpt"],
        });
        let details = ProjectDetails::parse(Category::DigitalDevelopment, &value).unwrap();
        let map = details.to_map();
        assert_eq!(map.get("liveUrl"), Some(&json!("https://example.com")));
        assert!(map.get("aiModels").is_none());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let value = json!({ "features": "not a list" });
        let err = ProjectDetails::parse(Category::DigitalDevelopment, &value).unwrap_err();
        assert!(matches!(err, ShapeError::Mismatch { category: Category::DigitalDevelopment, .. }));
    }

    #[test]
    fn test_parse_null_is_empty_details() {
        let details = ProjectDetails::parse(Category::CreativeStudio, &Value::Null).unwrap();
        assert_eq!(details, ProjectDetails::CreativeStudio(CreativeStudioDetails::default()));
    }

    #[test]
    fn test_legacy_categories_have_no_details() {
        let details = ProjectDetails::parse(Category::PaidAds, &json!({ "platforms": ["x"] })).unwrap();
        assert_eq!(details, ProjectDetails::Legacy(Category::PaidAds));
        assert!(details.to_map().is_empty());
        assert!(ProjectDetails::parse(Category::PaidAds, &json!([1])).is_err());
    }

    #[test]
    fn test_testimonial_round_trip_in_visual_storytelling() {
        let value = json!({
            "videoUrl": "https://video.example/1",
            "testimonial": { "quote": "Stunning", "author": "Ama", "position": "CMO" },
            "equipment": ["RED Komodo"]
        });
        let details = ProjectDetails::parse(Category::VisualStorytelling, &value).unwrap();
        match details {
            ProjectDetails::VisualStorytelling(d) => {
                assert_eq!(d.testimonial.unwrap().author, "Ama");
                assert_eq!(d.equipment, vec!["RED Komodo"]);
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_response_flattens_details() {
        let project = Project {
            id: "p1".into(),
            title: "Brand".into(),
            slug: "brand".into(),
            category: "creative-studio".into(),
            description: String::new(),
            client: String::new(),
            year: "2024".into(),
            duration: String::new(),
            image: String::new(),
            images: "[]".into(),
            technologies: r#"["Figma"]"#.into(),
            status: "published".into(),
            featured: 1,
            details: r##"{"brandColors":["#000"],"liveUrl":"ignored"}"##.into(),
            results: "[]".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let json = serde_json::to_value(project.to_response()).unwrap();
        assert_eq!(json["_id"], "p1");
        assert_eq!(json["featured"], true);
        assert_eq!(json["brandColors"], json!(["#000"]));
        assert!(json.get("liveUrl").is_none());
    }
}
