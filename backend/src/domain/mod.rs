//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities for users, segments, memberships
//! and the history ledger, plus the services implementing the driving ports.
//! Types validate on construction; serde contracts are documented on each
//! type.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - MembershipPlan: pure reconciliation of an update against stored rows.
//! - SegmentAssignmentService: the membership command/query engine.

pub mod error;
pub mod ports;

mod history;
mod history_csv;
mod history_report_service;
mod membership;
mod segment;
mod segment_assignment_service;
mod segment_catalogue_service;
mod slug;
mod trace_id;
mod user;
mod user_directory_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::history::{
    HistoryAction, HistoryEvent, HistoryPeriod, HistoryPeriodError, HistoryRecord,
    ParseHistoryActionError,
};
pub use self::history_csv::{CSV_DELIMITER, CSV_HEADER, render_history_csv, report_file_name};
pub use self::history_report_service::HistoryReportService;
pub use self::membership::{
    DEFAULT_MEMBERSHIP_TTL_YEARS, ExpiryPolicy, Membership, MembershipPlan, MembershipState,
    MembershipUpdate, MembershipUpdateRequest, PlannedUpsert, ResolvedAddition, SegmentAddition,
    UnknownSegments, UpsertKind,
};
pub use self::segment::{
    SEGMENT_DESCRIPTION_MAX, Segment, SegmentDescription, SegmentId, SegmentSlug,
    SegmentValidationError,
};
pub use self::segment_assignment_service::SegmentAssignmentService;
pub use self::segment_catalogue_service::SegmentCatalogueService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{USER_NAME_MAX, User, UserId, UserName, UserValidationError};
pub use self::user_directory_service::UserDirectoryService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use segments_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such user"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
