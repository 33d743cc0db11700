//! Segment catalogue entries.
//!
//! A segment is addressed externally by its slug; the numeric id is an
//! internal storage key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::slug::is_valid_slug;

/// Maximum allowed description length, in characters.
pub const SEGMENT_DESCRIPTION_MAX: usize = 256;

/// Validation errors raised by segment constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentValidationError {
    /// Identifiers are database serials and therefore strictly positive.
    #[error("segment id must be a positive integer")]
    NonPositiveId,
    /// The slug did not match the allowed shape.
    #[error("segment slug {slug:?} must be 1-64 lowercase letters, digits, '-' or '_'")]
    InvalidSlug { slug: String },
    /// The description exceeded [`SEGMENT_DESCRIPTION_MAX`].
    #[error("segment description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
}

/// Internal numeric segment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct SegmentId(i32);

impl SegmentId {
    /// Validate and construct a [`SegmentId`].
    pub fn new(id: i32) -> Result<Self, SegmentValidationError> {
        if id <= 0 {
            return Err(SegmentValidationError::NonPositiveId);
        }
        Ok(Self(id))
    }

    /// Raw identifier value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for SegmentId {
    type Error = SegmentValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentId> for i32 {
    fn from(value: SegmentId) -> Self {
        value.0
    }
}

/// Stable, human-readable segment key.
///
/// # Examples
/// ```
/// use segments_backend::domain::SegmentSlug;
///
/// let slug = SegmentSlug::new("avito_discount_30").expect("valid slug");
/// assert_eq!(slug.as_ref(), "avito_discount_30");
/// assert!(SegmentSlug::new("Not A Slug").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentSlug(String);

impl SegmentSlug {
    /// Validate and construct a [`SegmentSlug`].
    pub fn new(slug: impl Into<String>) -> Result<Self, SegmentValidationError> {
        let slug = slug.into();
        if !is_valid_slug(&slug) {
            return Err(SegmentValidationError::InvalidSlug { slug });
        }
        Ok(Self(slug))
    }

    /// Borrow the slug text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for SegmentSlug {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SegmentSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SegmentSlug {
    type Error = SegmentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentSlug> for String {
    fn from(value: SegmentSlug) -> Self {
        value.0
    }
}

/// Free-form segment description; may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentDescription(String);

impl SegmentDescription {
    /// Validate and construct a [`SegmentDescription`].
    pub fn new(description: impl Into<String>) -> Result<Self, SegmentValidationError> {
        let description = description.into();
        if description.chars().count() > SEGMENT_DESCRIPTION_MAX {
            return Err(SegmentValidationError::DescriptionTooLong {
                max: SEGMENT_DESCRIPTION_MAX,
            });
        }
        Ok(Self(description))
    }

    /// Borrow the description text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for SegmentDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for SegmentDescription {
    type Error = SegmentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentDescription> for String {
    fn from(value: SegmentDescription) -> Self {
        value.0
    }
}

/// Segment definition from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[schema(value_type = i32, example = 3)]
    pub id: SegmentId,
    #[schema(value_type = String, example = "avito_voice_messages")]
    pub slug: SegmentSlug,
    #[schema(value_type = String, example = "Voice messages beta")]
    pub description: SegmentDescription,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn invalid_slug_reports_offending_value() {
        let err = SegmentSlug::new("Bad Slug").expect_err("uppercase and space rejected");
        assert_eq!(
            err,
            SegmentValidationError::InvalidSlug {
                slug: "Bad Slug".to_owned()
            }
        );
        assert!(err.to_string().contains("\"Bad Slug\""));
    }

    #[rstest]
    fn description_allows_empty_and_caps_length() {
        assert!(SegmentDescription::new("").is_ok());
        let long = "d".repeat(SEGMENT_DESCRIPTION_MAX + 1);
        assert!(matches!(
            SegmentDescription::new(long),
            Err(SegmentValidationError::DescriptionTooLong { .. })
        ));
    }

    #[rstest]
    fn slug_deserialisation_validates() {
        assert!(serde_json::from_str::<SegmentSlug>("\"vip\"").is_ok());
        assert!(serde_json::from_str::<SegmentSlug>("\"VIP\"").is_err());
    }
}
