//! Field checks shared by the API handlers and the server actions.
//!
//! Each check returns `Err(message)` for the field; collect them with
//! `ValidationErrorBuilder::check` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$"
    ).unwrap();

    /// Lowercase words joined by single dashes
    static ref SLUG_REGEX: Regex = Regex::new(
        r"^[a-z0-9]+(-[a-z0-9]+)*$"
    ).unwrap();

    static ref HTTP_URL_REGEX: Regex = Regex::new(
        r"^https?://[^\s/$.?#][^\s]*$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(
        r"^\+?[0-9 ()./-]{6,24}$"
    ).unwrap();
}

/// A non-blank value of at most `max` characters
pub fn validate_required(value: &str, label: &str, max: usize) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{} is required", label));
    }
    if value.chars().count() > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Optional phone number; blank is accepted
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.is_empty() || PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err("Invalid phone number".to_string())
    }
}

pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("Slug is required".to_string());
    }
    if slug.len() > 120 {
        return Err("Slug is too long (max 120 characters)".to_string());
    }
    if !SLUG_REGEX.is_match(slug) {
        return Err("Slug must be lowercase letters, digits and single dashes".to_string());
    }
    Ok(())
}

/// Optional absolute http(s) URL or site-relative path (`/uploads/...`)
pub fn validate_optional_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() || (url.starts_with('/') && !url.starts_with("//")) {
        return Ok(());
    }
    if url.len() > 2048 {
        return Err("URL is too long (max 2048 characters)".to_string());
    }
    if !HTTP_URL_REGEX.is_match(url) {
        return Err("Must be an http(s) URL or a path starting with /".to_string());
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("Price must be a non-negative number".to_string());
    }
    Ok(())
}

/// Optional `YYYY-MM-DD` date
pub fn validate_date(date: &str) -> Result<(), String> {
    let date = date.trim();
    if date.is_empty() || chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err("Date must be formatted as YYYY-MM-DD".to_string())
    }
}

/// Currency as an ISO 4217 code
pub fn validate_currency(currency: &str) -> Result<(), String> {
    let currency = currency.trim();
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err("Currency must be a three-letter code such as USD".to_string())
    }
}
