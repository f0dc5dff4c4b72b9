//! Coursecraft Test Utilities
//!
//! Shared fixtures for tests that run against a real (in-memory) course store.
//!
//! # Usage
//!
//! ```rust,ignore
//! use coursecraft_test_utils::{CourseBuilder, DbSnapshot, FailureTrigger};
//!
//! #[tokio::test]
//! async fn test_refused_delete_changes_nothing() {
//!     let db = CourseDb::in_memory().await.unwrap();
//!     let seeded = CourseBuilder::publishable("inst-1").seed(&db).await.unwrap();
//!
//!     let before = DbSnapshot::capture(&db).await.unwrap();
//!     // ... operation that must not write ...
//!     assert_eq!(before, DbSnapshot::capture(&db).await.unwrap());
//! }
//! ```

pub mod fixtures;
pub mod snapshot;
pub mod triggers;

// Re-exports for convenience
pub use fixtures::{CourseBuilder, SeededCourse, SeededModule, FIXTURE_CATEGORY};
pub use snapshot::DbSnapshot;
pub use triggers::FailureTrigger;
