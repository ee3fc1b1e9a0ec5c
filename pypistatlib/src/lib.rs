//! # pypistatlib
//!
//! Core pipeline for reporting PyPI download statistics.
//!
//! ## Overview
//!
//! The public download-stats dataset answers SQL queries with JSON-shaped
//! tabular results. This library covers everything around that exchange
//! except the network call itself:
//!
//! - **Query composition**: bucket fields, package filter, and a validated
//!   relative/absolute time window, assembled into the query text
//! - **Result loading**: parsing the service's JSON response shape into
//!   billing info plus a header/rows table
//! - **Enrichment**: derived `percent` column and `Total` summary row
//! - **Rendering**: fixed-width pipe tables, with a markdown-alignment
//!   variant and thousands-separated counts
//!
//! Everything is synchronous and value-typed: each operation returns a fresh
//! result and never mutates its input, so components can be combined freely.
//!
//! ## Example
//!
//! ```rust
//! use pypistatlib::{tabulate, DownloadTable};
//!
//! let table = DownloadTable::new(
//!     vec!["python_version".into(), "download_count".into()],
//!     vec![
//!         vec!["3.11".into(), "905".into()],
//!         vec!["2.7".into(), "12".into()],
//!     ],
//! ).unwrap();
//!
//! let report = tabulate(&table.add_percentages().unwrap(), false);
//! assert!(report.contains("98.69%"));
//! ```

pub mod dates;
pub mod error;
pub mod query;
pub mod render;
pub mod result;
pub mod table;

pub use dates::{format_date, validate_date, END_TIMESTAMP, START_TIMESTAMP};
pub use error::PypistatError;
pub use query::{normalize_project, Field, QueryBuilder};
pub use render::{format_count, tabulate};
pub use result::{human_bytes, load_json_from_file, parse_json, QueryInfo};
pub use table::DownloadTable;

/// Result type for pypistatlib operations
pub type Result<T> = std::result::Result<T, PypistatError>;
