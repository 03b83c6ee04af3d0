//! mdaccess - accessibility review for markdown changes in unified diffs.
//!
//! The pipeline is: parse a diff into added markdown lines ([`diff`]), extract
//! document structure ([`markdown`]), ask a [`judge::Judge`] for findings,
//! reconcile its untrusted reply ([`reconcile`]), score deterministically
//! ([`scoring`]), and render one report ([`report`]).

pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod judge;
pub mod markdown;
pub mod prompt;
pub mod reconcile;
pub mod report;
pub mod review;
pub mod scoring;
pub mod types;

pub use error::Error;
