//! Shared validation helpers for inbound HTTP adapters.
//!
//! Each helper turns a raw request value into a domain type, reporting the
//! offending field (and array index where relevant) in the error details.

use serde_json::json;

use crate::domain::{
    Error, HistoryPeriod, HistoryPeriodError, SegmentDescription, SegmentSlug,
    SegmentValidationError, UserId, UserName, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUserId,
    InvalidUserName,
    InvalidSlug,
    InvalidDescription,
    InvalidPeriod,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUserId => "invalid_user_id",
            ErrorCode::InvalidUserName => "invalid_user_name",
            ErrorCode::InvalidSlug => "invalid_slug",
            ErrorCode::InvalidDescription => "invalid_description",
            ErrorCode::InvalidPeriod => "invalid_period",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn indexed_error(
    field: FieldName,
    index: usize,
    code: ErrorCode,
    message: impl Into<String>,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "index": index,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_user_id(raw: i32) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err: UserValidationError| {
        field_error(FieldName::new("id"), ErrorCode::InvalidUserId, err.to_string())
    })
}

pub(crate) fn parse_user_name(raw: String) -> Result<UserName, Error> {
    UserName::new(raw).map_err(|err| {
        field_error(FieldName::new("name"), ErrorCode::InvalidUserName, err.to_string())
    })
}

pub(crate) fn parse_slug(field: FieldName, raw: String) -> Result<SegmentSlug, Error> {
    SegmentSlug::new(raw)
        .map_err(|err| field_error(field, ErrorCode::InvalidSlug, err.to_string()))
}

/// Like [`parse_slug`] for an element of a request array.
pub(crate) fn parse_slug_at(
    field: FieldName,
    index: usize,
    raw: String,
) -> Result<SegmentSlug, Error> {
    SegmentSlug::new(raw)
        .map_err(|err| indexed_error(field, index, ErrorCode::InvalidSlug, err.to_string()))
}

pub(crate) fn parse_description(raw: String) -> Result<SegmentDescription, Error> {
    SegmentDescription::new(raw).map_err(|err: SegmentValidationError| {
        field_error(
            FieldName::new("description"),
            ErrorCode::InvalidDescription,
            err.to_string(),
        )
    })
}

pub(crate) fn parse_period(year: i32, month: u32) -> Result<HistoryPeriod, Error> {
    HistoryPeriod::new(year, month).map_err(|err| {
        let field = match err {
            HistoryPeriodError::InvalidMonth(_) => "month",
            HistoryPeriodError::InvalidYear(_) => "year",
        };
        field_error(FieldName::new(field), ErrorCode::InvalidPeriod, err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    fn details(err: &Error) -> &Value {
        err.details().expect("details present")
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn non_positive_ids_name_the_field(#[case] raw: i32) {
        let err = parse_user_id(raw).expect_err("rejected");
        assert_eq!(details(&err)["field"], "id");
        assert_eq!(details(&err)["code"], "invalid_user_id");
    }

    #[rstest]
    fn array_slugs_report_their_index() {
        let err = parse_slug_at(FieldName::new("remove"), 2, "Not A Slug".to_owned())
            .expect_err("rejected");
        assert_eq!(details(&err)["field"], "remove");
        assert_eq!(details(&err)["index"], 2);
        assert!(err.message().contains("Not A Slug"));
    }

    #[rstest]
    #[case(2025, 13, "month")]
    #[case(0, 1, "year")]
    fn period_errors_name_the_offending_field(
        #[case] year: i32,
        #[case] month: u32,
        #[case] field: &str,
    ) {
        let err = parse_period(year, month).expect_err("rejected");
        assert_eq!(details(&err)["field"], field);
        assert_eq!(details(&err)["code"], "invalid_period");
    }
}
