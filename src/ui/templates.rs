// Askama template definitions

use askama::Template;
use std::sync::Arc;

use crate::db::{
    AiAutomationDetails, Blog, ContactInput, CreativeStudioDetails, DigitalDevelopmentDetails,
    DigitalMarketingDetails, Message, Order, OrderInput, PricingPlanResponse, Project,
    ResultMetric, SiteSettings, VisualStorytellingDetails,
};
use crate::forms::{FieldView, OptionView, ResultRowView};
use crate::utils::truncate;

/// Custom filters for Askama templates
mod filters {
    /// `2026-10-19` or an RFC 3339 timestamp as `Oct 19, 2026`
    pub fn date(s: &str) -> ::askama::Result<String> {
        let day = s.get(..10).unwrap_or(s);
        Ok(chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|_| s.to_string()))
    }
}

// Project summary for grids
pub struct ProjectCard {
    pub slug: String,
    pub title: String,
    pub category_label: String,
    pub image: String,
    pub summary: String,
    pub client: String,
    pub year: String,
}

impl From<&Project> for ProjectCard {
    fn from(project: &Project) -> Self {
        Self {
            slug: project.slug.clone(),
            title: project.title.clone(),
            category_label: category_label(&project.category),
            image: project.image.clone(),
            summary: truncate(&project.description, 140),
            client: project.client.clone(),
            year: project.year.clone(),
        }
    }
}

/// Display label of a stored category string; unknown strings are shown as stored
pub fn category_label(category: &str) -> String {
    category
        .parse::<crate::db::Category>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| category.to_string())
}

// Blog summary for lists
pub struct BlogCard {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub image: String,
    pub excerpt: String,
    pub publication_date: String,
}

impl From<&Blog> for BlogCard {
    fn from(blog: &Blog) -> Self {
        Self {
            slug: blog.slug.clone(),
            title: blog.title.clone(),
            category: blog.category.clone(),
            image: blog.image.clone(),
            excerpt: truncate(&blog.excerpt, 200),
            publication_date: blog.publication_date.clone(),
        }
    }
}

// Fields every showcase template shows
pub struct ProjectView {
    pub title: String,
    pub category: String,
    pub category_label: String,
    pub description: String,
    pub client: String,
    pub year: String,
    pub duration: String,
    pub image: String,
    pub images: Vec<String>,
    pub technologies: Vec<String>,
    pub results: Vec<ResultMetric>,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            category: project.category.clone(),
            category_label: category_label(&project.category),
            description: project.description.clone(),
            client: project.client.clone(),
            year: project.year.clone(),
            duration: project.duration.clone(),
            image: project.image.clone(),
            images: project.images_list(),
            technologies: project.technologies_list(),
            results: project.results_list(),
        }
    }
}

// Plan card on the pricing page
pub struct PlanCard {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub price_label: String,
    pub period: String,
    pub features: Vec<String>,
    pub popular: bool,
    pub selected: bool,
}

impl PlanCard {
    pub fn new(plan: &PricingPlanResponse, selected: Option<&str>) -> Self {
        let price_label = if plan.is_custom {
            "Let's talk".to_string()
        } else {
            format!("{} {}", plan.currency, format_price(plan.price))
        };
        Self {
            id: plan.id.clone(),
            name: plan.name.clone(),
            tagline: plan.tagline.clone(),
            price_label,
            period: plan.period.clone(),
            features: plan.features.clone(),
            popular: plan.popular,
            selected: selected == Some(plan.id.as_str()),
        }
    }
}

/// `1500` → `1,500`; cents are kept only when present
pub fn format_price(price: f64) -> String {
    let whole = price.trunc() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        grouped.insert(0, '-');
    }
    let cents = ((price - price.trunc()).abs() * 100.0).round() as i64;
    if cents > 0 {
        format!("{}.{:02}", grouped, cents)
    } else {
        grouped
    }
}

pub struct CategoryLink {
    pub value: String,
    pub label: String,
    pub active: bool,
}

// Public pages

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site: Arc<SiteSettings>,
    /// Featured projects
    pub projects: Vec<ProjectCard>,
    pub blogs: Vec<BlogCard>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub site: Arc<SiteSettings>,
    pub categories: Vec<CategoryLink>,
}

#[derive(Template)]
#[template(path = "works.html")]
pub struct WorksTemplate {
    pub site: Arc<SiteSettings>,
    pub projects: Vec<ProjectCard>,
    pub categories: Vec<CategoryLink>,
    pub filtered: bool,
}

#[derive(Template)]
#[template(path = "blog_list.html")]
pub struct BlogListTemplate {
    pub site: Arc<SiteSettings>,
    pub blogs: Vec<BlogCard>,
}

#[derive(Template)]
#[template(path = "blog_detail.html")]
pub struct BlogDetailTemplate {
    pub site: Arc<SiteSettings>,
    pub blog: Blog,
}

#[derive(Template)]
#[template(path = "blog_not_found.html")]
pub struct BlogNotFoundTemplate {
    pub site: Arc<SiteSettings>,
}

// Not-found and error pages
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessagePageTemplate {
    pub site: Arc<SiteSettings>,
    pub heading: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub site: Arc<SiteSettings>,
    pub plans: Vec<PlanCard>,
    /// Plan the order form is for, copied into hidden inputs
    pub selected: Option<PricingPlanResponse>,
    pub order: OrderInput,
    pub notice: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub site: Arc<SiteSettings>,
    pub form: ContactInput,
    pub notice: Option<String>,
    pub errors: Vec<String>,
}

// Project showcases, one per category

#[derive(Template)]
#[template(path = "showcase/creative_studio.html")]
pub struct CreativeStudioShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
    pub details: CreativeStudioDetails,
}

#[derive(Template)]
#[template(path = "showcase/digital_development.html")]
pub struct DigitalDevelopmentShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
    pub details: DigitalDevelopmentDetails,
}

#[derive(Template)]
#[template(path = "showcase/ai_automation.html")]
pub struct AiAutomationShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
    pub details: AiAutomationDetails,
}

#[derive(Template)]
#[template(path = "showcase/digital_marketing.html")]
pub struct DigitalMarketingShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
    pub details: DigitalMarketingDetails,
}

#[derive(Template)]
#[template(path = "showcase/visual_storytelling.html")]
pub struct VisualStorytellingShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
    pub details: VisualStorytellingDetails,
}

#[derive(Template)]
#[template(path = "showcase/legacy.html")]
pub struct LegacyShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
}

#[derive(Template)]
#[template(path = "showcase/generic.html")]
pub struct GenericShowcase {
    pub site: Arc<SiteSettings>,
    pub project: ProjectView,
}

// Dashboard

pub struct DashboardCounts {
    pub projects: i64,
    pub published: i64,
    pub blogs: i64,
    pub pending_orders: i64,
    pub unread_messages: i64,
}

pub struct ProjectRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub category_label: String,
    pub status: String,
    pub featured: bool,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            title: project.title.clone(),
            slug: project.slug.clone(),
            category_label: category_label(&project.category),
            status: project.status.clone(),
            featured: project.featured != 0,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub version: String,
}

#[derive(Template)]
#[template(path = "dashboard/overview.html")]
pub struct OverviewTemplate {
    pub counts: DashboardCounts,
    pub recent_orders: Vec<Order>,
    pub recent_messages: Vec<Message>,
}

#[derive(Template)]
#[template(path = "dashboard/projects.html")]
pub struct ProjectsTemplate {
    pub projects: Vec<ProjectRow>,
}

#[derive(Template)]
#[template(path = "dashboard/project_form.html")]
pub struct ProjectFormTemplate {
    pub heading: String,
    pub id: String,
    pub submit_label: String,
    pub categories: Vec<OptionView>,
    pub statuses: Vec<OptionView>,
    pub fields: Vec<FieldView>,
    pub results: Vec<ResultRowView>,
    pub error: Option<String>,
    pub field_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "dashboard/blogs.html")]
pub struct BlogsTemplate {
    pub blogs: Vec<Blog>,
}

#[derive(Template)]
#[template(path = "dashboard/pricing.html")]
pub struct PricingListTemplate {
    pub plans: Vec<PricingPlanResponse>,
}

/// Blog, pricing plan and settings forms
#[derive(Template)]
#[template(path = "dashboard/form.html")]
pub struct EntityFormTemplate {
    pub heading: String,
    pub action: String,
    pub back: String,
    pub id: String,
    pub submit_label: String,
    pub fields: Vec<FieldView>,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub field_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "dashboard/orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<Order>,
    pub statuses: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "dashboard/messages.html")]
pub struct MessagesTemplate {
    pub messages: Vec<Message>,
}
