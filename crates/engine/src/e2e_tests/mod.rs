//! E2E tests against a real PostgreSQL + Apache AGE container.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p statedb-engine --lib e2e_tests -- --ignored --test-threads=1
//! ```

mod age_test_harness;

pub use age_test_harness::*;
