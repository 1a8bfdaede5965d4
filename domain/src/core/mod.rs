//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`clock`]: timestamp helpers used by records and results

pub mod clock;
pub mod error;
