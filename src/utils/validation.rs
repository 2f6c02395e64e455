//! Validation Utilities
//!
//! Input validation helpers shared by request payloads and services.

use chrono::{Datelike, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Earliest release year accepted for a movie
pub const MIN_RELEASE_YEAR: i32 = 1800;

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whether a file name carries one of the accepted poster image extensions
pub fn has_image_extension(file_name: &str) -> bool {
    static IMAGE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IMAGE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$").expect("Failed to compile image regex")
    });

    regex.is_match(file_name)
}

/// Parses a release year, accepting 1800 up to the current year
pub fn parse_release_year(raw: &str) -> Result<i32, String> {
    let year: i32 = raw
        .trim()
        .parse()
        .map_err(|_| messages::INVALID_YEAR.to_string())?;

    let current_year = Utc::now().year();
    if !(MIN_RELEASE_YEAR..=current_year).contains(&year) {
        return Err(format!(
            "Year must be between {} and {}",
            MIN_RELEASE_YEAR, current_year
        ));
    }

    Ok(year)
}

/// Trims a title and rejects it when nothing remains
pub fn normalize_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(messages::TITLE_REQUIRED.to_string());
    }
    if title.chars().count() > 255 {
        return Err(messages::TITLE_TOO_LONG.to_string());
    }
    Ok(title.to_string())
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const TITLE_REQUIRED: &str = "Title is required";
    pub const TITLE_TOO_LONG: &str = "Title must be at most 255 characters";
    pub const INVALID_YEAR: &str = "Year must be a number";
    pub const POSTER_REQUIRED: &str = "Poster image is required";
    pub const IMAGE_TYPE: &str = "Only image files are allowed!";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension("poster.jpg"));
        assert!(has_image_extension("poster.JPEG"));
        assert!(has_image_extension("my.poster.webp"));
        assert!(has_image_extension("anim.gif"));
        assert!(!has_image_extension("poster.bmp"));
        assert!(!has_image_extension("poster.png.exe"));
        assert!(!has_image_extension("png"));
    }

    #[test]
    fn test_parse_release_year() {
        assert_eq!(parse_release_year("1994"), Ok(1994));
        assert_eq!(parse_release_year(" 1800 "), Ok(1800));
        assert!(parse_release_year("1799").is_err());
        assert!(parse_release_year("abc").is_err());
        assert!(parse_release_year("").is_err());

        let next_year = (Utc::now().year() + 1).to_string();
        assert!(parse_release_year(&next_year).is_err());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  The Matrix "),
            Ok("The Matrix".to_string())
        );
        assert!(normalize_title("   ").is_err());
        assert!(normalize_title(&"a".repeat(256)).is_err());
    }
}
