use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+966|0)?5[0-9]{8}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const MAX_PHOTOS: usize = 5;
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB
pub const MIN_PASSWORD_LEN: usize = 8;

/// Strips all whitespace, the form lets customers type "055 123 4567".
pub fn normalize_mobile(mobile: &str) -> String {
    mobile.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn is_saudi_mobile(mobile: &str) -> bool {
    MOBILE_REGEX.is_match(&normalize_mobile(mobile))
}

pub fn validate_saudi_mobile(mobile: &str) -> Result<(), ValidationError> {
    if is_saudi_mobile(mobile) {
        Ok(())
    } else {
        Err(ValidationError::new("mobile"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_image_content_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/jpeg" | "image/png" | "image/gif" | "image/webp"
    )
}

/// Accepts a hosted image URL, or an inline `data:image/...;base64,` URL
/// whose decoded size fits the photo limit.
pub fn validate_photo_reference(photo: &str) -> Result<(), String> {
    if photo.starts_with("https://") || photo.starts_with("http://") {
        return Ok(());
    }

    let rest = photo
        .strip_prefix("data:")
        .ok_or_else(|| "photo must be an image URL".to_string())?;
    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| "photo must be base64 encoded".to_string())?;

    if !validate_image_content_type(content_type) {
        return Err(format!("unsupported photo type {}", content_type));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| "photo is not valid base64".to_string())?;
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err("each photo must be smaller than 5MB".to_string());
    }

    Ok(())
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(input: Option<&str>) -> Option<String> {
    input.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
