//! Test support utilities for glc integration tests
//!
//! Shared helpers that build a real git repository, a throwaway config home
//! and, when asked, a bare `origin` to push to. Used only during development
//! and testing, not published.

pub mod test_env;

pub use test_env::CliTestEnvironment;
