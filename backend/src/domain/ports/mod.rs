//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`HistoryReportWriter`]) are implemented by
//! outbound adapters. Driving ports ([`SegmentAssignmentCommand`],
//! [`SegmentAssignmentQuery`], [`UserDirectory`], [`SegmentCatalogue`],
//! [`HistoryReportCommand`]) are implemented by domain services and consumed
//! by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod history_report_command;
mod history_report_writer;
mod segment_assignment_command;
mod segment_assignment_query;
mod segment_assignment_repository;
mod segment_catalogue;
mod segment_repository;
mod user_directory;
mod user_repository;

#[cfg(test)]
pub use history_report_command::MockHistoryReportCommand;
pub use history_report_command::{HistoryReport, HistoryReportCommand, REPORTS_ROUTE_PREFIX};
#[cfg(test)]
pub use history_report_writer::MockHistoryReportWriter;
pub use history_report_writer::{HistoryReportWriter, HistoryReportWriterError};
#[cfg(test)]
pub use segment_assignment_command::MockSegmentAssignmentCommand;
pub use segment_assignment_command::{MembershipUpdateOutcome, SegmentAssignmentCommand};
#[cfg(test)]
pub use segment_assignment_query::MockSegmentAssignmentQuery;
pub use segment_assignment_query::SegmentAssignmentQuery;
#[cfg(test)]
pub use segment_assignment_repository::MockSegmentAssignmentRepository;
pub use segment_assignment_repository::{
    AppliedMembershipUpdate, SegmentAssignmentRepository, SegmentAssignmentRepositoryError,
};
#[cfg(test)]
pub use segment_catalogue::MockSegmentCatalogue;
pub use segment_catalogue::SegmentCatalogue;
#[cfg(test)]
pub use segment_repository::MockSegmentRepository;
pub use segment_repository::{SegmentPersistenceError, SegmentRepository};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
