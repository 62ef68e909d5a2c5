use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 100;
const MAX_ICON_LEN: usize = 64;
const MAX_URL_LEN: usize = 2048;

fn validate_text(value: &str, field: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(Error::Validation(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::Validation(format!(
            "{field} cannot contain control characters"
        )));
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<()> {
    validate_text(name, "Group name", MAX_NAME_LEN)
}

pub fn validate_role_name(name: &str) -> Result<()> {
    validate_text(name, "Role name", MAX_NAME_LEN)
}

pub fn validate_label(label: &str) -> Result<()> {
    validate_text(label, "Label", MAX_NAME_LEN)
}

pub fn validate_order(order: i32) -> Result<()> {
    if order < 0 {
        return Err(Error::Validation("Order cannot be negative".to_string()));
    }
    Ok(())
}

pub fn validate_icon(icon: Option<&str>) -> Result<()> {
    match icon {
        Some(icon) => validate_text(icon, "Icon", MAX_ICON_LEN),
        None => Ok(()),
    }
}

/// Menu targets are either app-relative paths or absolute http(s) links.
pub fn validate_url(url: Option<&str>) -> Result<()> {
    let Some(url) = url else {
        return Ok(());
    };
    validate_text(url, "URL", MAX_URL_LEN)?;
    if url.contains(char::is_whitespace) {
        return Err(Error::Validation("URL cannot contain whitespace".to_string()));
    }
    if !(url.starts_with('/') || url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Validation(
            "URL must be a path starting with '/' or an http(s) link".to_string(),
        ));
    }
    Ok(())
}
