//! Credential report parsing and data structures.
//!
//! This module turns the CSV credential report produced by AWS IAM into
//! typed per-user rows.
//!
//! ## Key Components
//!
//! - [`types`] - Typed report rows and the last-used tagged union
//! - [`parser`] - Tolerant CSV parser that skips malformed rows
//!
//! ## Example
//!
//! ```
//! use awsklean::report::parser::parse_report;
//!
//! let raw = "user,arn,user_creation_time,password_enabled,password_last_used\n\
//!            alice,arn:aws:iam::1:user/alice,2020-01-01T00:00:00+00:00,true,no_information\n";
//! let report = parse_report(raw);
//! assert_eq!(report.rows.len(), 0); // access key columns are missing
//! assert_eq!(report.skipped, 1);
//! ```

pub mod parser;
pub mod types;
