//! Server actions: the mutations and queries behind the dashboard forms.
//!
//! Mutating actions take a [`Submission`](crate::forms::Submission), decode it
//! into the typed input, validate and persist. The admin JSON API calls the
//! same typed `save_*` functions with inputs decoded from request bodies, so
//! both paths share one set of rules.

mod content;
mod inbox;
mod projects;
mod settings;

pub use content::{
    create_blog, create_pricing_plan, delete_blog, delete_pricing_plan, get_blogs,
    get_pricing_plans, save_blog, save_pricing_plan, update_blog, update_pricing_plan,
};
pub use inbox::{
    get_messages, get_orders, mark_message_read, place_order, send_message, update_order_status,
};
pub use projects::{
    create_project, delete_project, get_projects, save_project, update_project, validate_project,
};
pub use settings::{get_settings, save_settings, update_settings};

/// Trim every entry and drop the blank ones
fn compact(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
