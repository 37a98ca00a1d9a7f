//! Common types and utilities shared across models.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Current time in the RFC 3339 format stored in every timestamp column
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Helper to parse a JSON list column. Malformed JSON reads as an empty list.
pub fn parse_json_list<T: DeserializeOwned>(json: &str) -> Vec<T> {
    serde_json::from_str(json).unwrap_or_default()
}

/// Helper to serialize a list for a JSON column
pub fn serialize_json_list<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Derive a URL slug from a title: lowercase ASCII words joined by dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Publication status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [Self::Draft, Self::Published, Self::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

/// Lifecycle of an order placed from the pricing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [Self::Pending, Self::Confirmed, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Read state of a contact message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            _ => Err(format!("Unknown message status: {}", s)),
        }
    }
}

/// Body of the status-change endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Brand -- Refresh 2024! "), "brand-refresh-2024");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_parse_json_list_tolerates_garbage() {
        let items: Vec<String> = parse_json_list("not json");
        assert!(items.is_empty());
        let items: Vec<String> = parse_json_list(r#"["a","b"]"#);
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Published".parse::<ProjectStatus>(), Ok(ProjectStatus::Published));
        assert!("deleted".parse::<ProjectStatus>().is_err());
        assert_eq!("confirmed".parse::<OrderStatus>(), Ok(OrderStatus::Confirmed));
        assert_eq!("read".parse::<MessageStatus>(), Ok(MessageStatus::Read));
        assert_eq!(ProjectStatus::default(), ProjectStatus::Draft);
    }
}
