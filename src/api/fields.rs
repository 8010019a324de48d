use crate::error::AppError;

/// A title must be present and not blank. Returns it trimmed.
pub fn required_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    Ok(title.to_string())
}

/// Blank descriptions are stored as absent.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
