//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` with `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Membership planning stays in the domain.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Transactional updates**: a membership update runs inside one
//!   transaction holding row locks on the user and the affected memberships.
//!
//! # Example
//!
//! ```ignore
//! use segments_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/segments")).await?;
//! let repo = DieselUserRepository::new(pool);
//! ```

mod diesel_helpers;
mod diesel_segment_assignment_repository;
mod diesel_segment_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_segment_assignment_repository::DieselSegmentAssignmentRepository;
pub use diesel_segment_repository::DieselSegmentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
