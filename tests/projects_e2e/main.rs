//! Project API E2E test suite.
//!
//! Drives the real router against a temporary SQLite database and upload
//! directory; no external services are needed.
//!
//! Run with: cargo test --test projects_e2e

mod test_helpers;

mod test_create;
mod test_health;
mod test_read_update;
