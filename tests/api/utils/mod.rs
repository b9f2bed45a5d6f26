//! Test utilities and fixtures
//!
//! Provides:
//! - Application test harness (AppTest)
//! - Database seeding helpers (TestDatabase)

pub use app_test::AppTest;
pub use db::TestDatabase;
