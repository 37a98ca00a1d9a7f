//! Dashboard form state and submission assembly.
//!
//! Dashboard forms are rendered on the server. Every POST carries the whole
//! current state of the form plus an `op`: `add:<field>` and
//! `remove:<field>:<index>` edit a list field and re-render the form, `save`
//! turns the state into a [`Submission`] for the matching server action.
//! A submission mirrors browser form data: every value is a string and list
//! fields travel as JSON arrays.

mod content;
mod list;
mod project;

pub use content::{BlogForm, PricingForm, SettingsForm};
pub use list::DynamicList;
pub use project::{ProjectForm, ResultRowView};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Error decoding a submission into a typed input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{field} is not valid JSON: {reason}")]
    InvalidJson { field: String, reason: String },
    #[error("{field} must be a number")]
    InvalidNumber { field: String },
}

impl SubmissionError {
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidJson { field, .. } | Self::InvalidNumber { field } => field,
        }
    }
}

/// Flat string payload handed from a form to a server action
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Submission {
    fields: BTreeMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Store a value serialized as JSON
    pub fn insert_json<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        self.fields.insert(key.into(), json);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value of `key`, empty when absent
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Trimmed value of `key`, `None` when absent or blank
    pub fn optional_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true") | Some("on") | Some("1"))
    }

    /// Decode a JSON value; an absent or blank value decodes to `T::default()`
    pub fn json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, SubmissionError> {
        match self.optional_text(key) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| SubmissionError::InvalidJson {
                field: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parse a number; an absent or blank value is zero
    pub fn number(&self, key: &str) -> Result<f64, SubmissionError> {
        match self.optional_text(key) {
            None => Ok(0.0),
            Some(raw) => raw
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| SubmissionError::InvalidNumber {
                    field: key.to_string(),
                }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Key/value pairs of a posted dashboard form, in posting order
#[derive(Debug, Clone, Default)]
pub struct PostedFields {
    pairs: Vec<(String, String)>,
}

impl PostedFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value posted under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// The requested operation; a form posted without one is only re-rendered
    pub fn op(&self) -> FormOp {
        self.get("op")
            .and_then(|op| op.parse().ok())
            .unwrap_or(FormOp::Refresh)
    }

    /// Values of `<prefix>.<n>` keys ordered by `n`
    pub fn indexed(&self, prefix: &str) -> Vec<String> {
        let mut found: BTreeMap<usize, String> = BTreeMap::new();
        for (key, value) in &self.pairs {
            if let Some(index) = key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| rest.parse::<usize>().ok())
            {
                found.insert(index, value.clone());
            }
        }
        found.into_values().collect()
    }

    /// Groups of `<prefix>.<n>.<field>` keys ordered by `n`
    pub fn indexed_records(&self, prefix: &str) -> Vec<BTreeMap<String, String>> {
        let mut found: BTreeMap<usize, BTreeMap<String, String>> = BTreeMap::new();
        for (key, value) in &self.pairs {
            let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('.')) else {
                continue;
            };
            let Some((index, field)) = rest.split_once('.') else {
                continue;
            };
            if let Ok(index) = index.parse::<usize>() {
                found
                    .entry(index)
                    .or_default()
                    .insert(field.to_string(), value.clone());
            }
        }
        found.into_values().collect()
    }
}

/// What a dashboard form POST asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOp {
    Save,
    Refresh,
    Add(String),
    Remove(String, usize),
}

impl std::str::FromStr for FormOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("save"), None, None, None) => Ok(Self::Save),
            (Some("refresh"), None, None, None) => Ok(Self::Refresh),
            (Some("add"), Some(field), None, None) if !field.is_empty() => {
                Ok(Self::Add(field.to_string()))
            }
            (Some("remove"), Some(field), Some(index), None) if !field.is_empty() => index
                .parse::<usize>()
                .map(|i| Self::Remove(field.to_string(), i))
                .map_err(|_| format!("Invalid index in form op: {}", s)),
            _ => Err(format!("Unknown form op: {}", s)),
        }
    }
}

/// Whether a form creates a record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

impl FormMode {
    /// Edit when initial data (its id) is present, create otherwise
    pub fn from_initial_id(id: Option<&str>) -> Self {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::Edit { id: id.to_string() },
            None => Self::Create,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Edit { id } => Some(id),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Edit { .. } => "Update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Html,
    Url,
    Number,
    Date,
    Flag,
    List,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "longtext",
            Self::Html => "html",
            Self::Url => "url",
            Self::Number => "number",
            Self::Date => "date",
            Self::Flag => "flag",
            Self::List => "list",
        }
    }
}

/// One input of a form: submission key, label and input kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const fn field(key: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { key, label, kind }
}

/// Values of a form between round trips, keyed by field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: BTreeMap<String, String>,
    flags: BTreeMap<String, bool>,
    lists: BTreeMap<String, DynamicList<String>>,
}

impl FormState {
    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    pub fn list(&self, key: &str) -> &[String] {
        self.lists.get(key).map(|l| l.items()).unwrap_or_default()
    }

    pub fn set_list(&mut self, key: &str, items: Vec<String>) {
        self.lists.insert(key.to_string(), DynamicList::from_vec(items));
    }

    pub fn list_mut(&mut self, key: &str) -> &mut DynamicList<String> {
        self.lists.entry(key.to_string()).or_default()
    }

    /// Take the posted values of `specs`. Unchecked checkboxes are not posted,
    /// so a missing flag reads as false.
    pub fn read_posted(&mut self, specs: &[FieldSpec], posted: &PostedFields) {
        for spec in specs {
            match spec.kind {
                FieldKind::Flag => self.set_flag(spec.key, posted.has(spec.key)),
                FieldKind::List => {
                    let list = self.list_mut(spec.key);
                    *list = DynamicList::new();
                    for value in posted.indexed(spec.key) {
                        let index = list.append();
                        list.update(index, value);
                    }
                }
                _ => {
                    if let Some(value) = posted.get(spec.key) {
                        self.set_value(spec.key, value);
                    }
                }
            }
        }
    }

    /// Apply an add/remove op to a list field of `specs`. Returns whether anything changed.
    pub fn apply_list_op(&mut self, specs: &[FieldSpec], op: &FormOp) -> bool {
        let is_list = |key: &str| {
            specs
                .iter()
                .any(|s| s.key == key && s.kind == FieldKind::List)
        };
        match op {
            FormOp::Add(key) if is_list(key) => {
                self.list_mut(key).append();
                true
            }
            FormOp::Remove(key, index) if is_list(key) => self.list_mut(key).remove(*index).is_some(),
            _ => false,
        }
    }

    /// Write the fields of `specs` into a submission: text trimmed, flags as
    /// `"true"`/`"false"`, lists as JSON arrays without blank entries.
    pub fn write_submission(&self, specs: &[FieldSpec], submission: &mut Submission) {
        for spec in specs {
            match spec.kind {
                FieldKind::Flag => {
                    submission.insert(spec.key, if self.flag(spec.key) { "true" } else { "false" })
                }
                FieldKind::List => {
                    let list = self.lists.get(spec.key).cloned().unwrap_or_default();
                    submission.insert(spec.key, list.compacted().to_json());
                }
                _ => submission.insert(spec.key, self.value(spec.key).trim()),
            }
        }
    }

    pub fn views(&self, specs: &[FieldSpec]) -> Vec<FieldView> {
        specs
            .iter()
            .map(|spec| FieldView {
                key: spec.key.to_string(),
                label: spec.label.to_string(),
                kind: spec.kind.as_str(),
                value: self.value(spec.key).to_string(),
                checked: self.flag(spec.key),
                add_op: format!("add:{}", spec.key),
                items: self
                    .list(spec.key)
                    .iter()
                    .enumerate()
                    .map(|(index, value)| ListItemView {
                        name: format!("{}.{}", spec.key, index),
                        value: value.clone(),
                        remove_op: format!("remove:{}:{}", spec.key, index),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Render-ready description of one form input
#[derive(Debug, Clone)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub kind: &'static str,
    pub value: String,
    pub checked: bool,
    pub add_op: String,
    pub items: Vec<ListItemView>,
}

#[derive(Debug, Clone)]
pub struct ListItemView {
    pub name: String,
    pub value: String,
    pub remove_op: String,
}

/// An `<option>` of a select input
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
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
    fn test_form_op_parsing() {
        assert_eq!("save".parse::<FormOp>(), Ok(FormOp::Save));
        assert_eq!("add:features".parse::<FormOp>(), Ok(FormOp::Add("features".into())));
        assert_eq!(
            "remove:images:2".parse::<FormOp>(),
            Ok(FormOp::Remove("images".into(), 2))
        );
        assert!("remove:images:x".parse::<FormOp>().is_err());
        assert!("add:".parse::<FormOp>().is_err());
        assert!("delete".parse::<FormOp>().is_err());
    }

    #[test]
    fn test_posted_without_op_is_refresh() {
        assert_eq!(posted(&[("title", "x")]).op(), FormOp::Refresh);
        assert_eq!(posted(&[("op", "save")]).op(), FormOp::Save);
    }

    #[test]
    fn test_indexed_orders_by_index() {
        let fields = posted(&[
            ("features.2", "c"),
            ("features.0", "a"),
            ("featuresX.1", "ignored"),
            ("features.1", "b"),
            ("features.1.metric", "ignored"),
        ]);
        assert_eq!(fields.indexed("features"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_indexed_records() {
        let fields = posted(&[
            ("results.1.metric", "Revenue"),
            ("results.0.metric", "Traffic"),
            ("results.0.value", "+40%"),
        ]);
        let records = fields.indexed_records("results");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("value").map(String::as_str), Some("+40%"));
        assert_eq!(records[1].get("metric").map(String::as_str), Some("Revenue"));
    }

    #[test]
    fn test_form_mode_from_initial_id() {
        assert_eq!(FormMode::from_initial_id(None), FormMode::Create);
        assert_eq!(FormMode::from_initial_id(Some("  ")), FormMode::Create);
        assert_eq!(
            FormMode::from_initial_id(Some("abc")),
            FormMode::Edit { id: "abc".into() }
        );
    }

    #[test]
    fn test_submission_decoding() {
        let mut submission = Submission::new();
        submission.insert("features", r#"["a","b"]"#);
        submission.insert("broken", "[1,");
        submission.insert("price", "2,500");
        submission.insert("featured", "true");

        let features: Vec<String> = submission.json("features").unwrap();
        assert_eq!(features, vec!["a", "b"]);
        let missing: Vec<String> = submission.json("missing").unwrap();
        assert!(missing.is_empty());
        let err = submission.json::<Vec<String>>("broken").unwrap_err();
        assert_eq!(err.field(), "broken");
        assert_eq!(submission.number("price").unwrap(), 2500.0);
        assert!(submission.flag("featured"));
        assert!(!submission.flag("popular"));
    }

    #[test]
    fn test_form_state_list_ops_only_touch_list_fields() {
        const SPECS: &[FieldSpec] = &[
            field("title", "Title", FieldKind::Text),
            field("features", "Features", FieldKind::List),
        ];
        let mut state = FormState::default();
        state.read_posted(SPECS, &posted(&[("title", "Site"), ("features.0", "Fast")]));

        assert!(state.apply_list_op(SPECS, &FormOp::Add("features".into())));
        assert_eq!(state.list("features").len(), 2);
        assert!(!state.apply_list_op(SPECS, &FormOp::Add("title".into())));
        assert!(state.apply_list_op(SPECS, &FormOp::Remove("features".into(), 1)));
        assert!(!state.apply_list_op(SPECS, &FormOp::Remove("features".into(), 9)));

        let mut submission = Submission::new();
        state.write_submission(SPECS, &mut submission);
        assert_eq!(submission.get("title"), Some("Site"));
        assert_eq!(submission.get("features"), Some(r#"["Fast"]"#));
    }
}
