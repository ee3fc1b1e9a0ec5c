//! Query composition for the public download-stats dataset.
//!
//! Builds the SQL text that the CLI hands off to a query client. Fields
//! describe the columns a download can be bucketed by; the builder assembles
//! SELECT / WHERE / GROUP BY / ORDER BY / LIMIT around them with a validated
//! time window.

use std::str::FromStr;

use crate::dates::{format_date, END_TIMESTAMP, START_TIMESTAMP};
use crate::Result;

/// Fully qualified name of the public download-log table.
const FROM_TABLE: &str = "`bigquery-public-data.pypi.file_downloads`";

/// Default window: the 30 full days ending yesterday.
const DEFAULT_START_DATE: &str = "-31";
const DEFAULT_END_DATE: &str = "-1";

/// Default row cap for composed queries.
const DEFAULT_LIMIT: u32 = 10;

/// A column downloads can be bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Package name
    Project,
    /// Package version
    Version,
    /// Distribution file type (wheel vs sdist)
    FileType,
    /// Two-component Python version, e.g. `3.11`
    PythonVersion,
    /// Interpreter implementation name
    Implementation,
    /// Operating system name
    SystemName,
    /// Linux distribution name
    DistroName,
    /// Two-letter country code of the downloader
    CountryCode,
    /// Installer tool name, e.g. pip
    Installer,
}

impl Field {
    /// Column name in the result (and in GROUP BY).
    pub fn name(&self) -> &'static str {
        match self {
            Field::Project => "project",
            Field::Version => "version",
            Field::FileType => "file_type",
            Field::PythonVersion => "python_version",
            Field::Implementation => "implementation",
            Field::SystemName => "system_name",
            Field::DistroName => "distro_name",
            Field::CountryCode => "country_code",
            Field::Installer => "installer_name",
        }
    }

    /// SELECT expression the column is computed from.
    pub fn expression(&self) -> &'static str {
        match self {
            Field::Project => "file.project",
            Field::Version => "file.version",
            Field::FileType => "file.type",
            Field::PythonVersion => r#"REGEXP_EXTRACT(details.python, r"^([^\.]+\.[^\.]+)")"#,
            Field::Implementation => "details.implementation.name",
            Field::SystemName => "details.system.name",
            Field::DistroName => "details.distro.name",
            Field::CountryCode => "country_code",
            Field::Installer => "details.installer.name",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Field::Project),
            "version" => Ok(Field::Version),
            "file_type" | "file-type" => Ok(Field::FileType),
            "pyversion" | "python_version" | "python-version" => Ok(Field::PythonVersion),
            "impl" | "implementation" => Ok(Field::Implementation),
            "system" | "system_name" => Ok(Field::SystemName),
            "distro" | "distro_name" => Ok(Field::DistroName),
            "country" | "country_code" => Ok(Field::CountryCode),
            "installer" | "installer_name" => Ok(Field::Installer),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// Normalize a package name the way the index does: lowercase, with runs of
/// `-`, `_`, and `.` collapsed to a single `-`.
pub fn normalize_project(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            in_separator = true;
        } else {
            if in_separator {
                normalized.push('-');
                in_separator = false;
            }
            normalized.extend(ch.to_lowercase());
        }
    }
    if in_separator {
        normalized.push('-');
    }
    normalized
}

/// Builder for download-count queries.
///
/// ```
/// use pypistatlib::{Field, QueryBuilder};
///
/// let sql = QueryBuilder::new()
///     .project("cryptography")
///     .field(Field::PythonVersion)
///     .build()
///     .unwrap();
/// assert!(sql.contains("GROUP BY python_version"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    project: Option<String>,
    fields: Vec<Field>,
    start_date: String,
    end_date: String,
    limit: u32,
    all_installers: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            project: None,
            fields: Vec::new(),
            start_date: DEFAULT_START_DATE.to_string(),
            end_date: DEFAULT_END_DATE.to_string(),
            limit: DEFAULT_LIMIT,
            all_installers: false,
        }
    }

    /// Restrict the query to one package (name is normalized).
    pub fn project(mut self, name: &str) -> Self {
        self.project = Some(normalize_project(name));
        self
    }

    /// Bucket downloads by `field` (appended in SELECT order).
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the window start (negative day offset or YYYY-MM-DD).
    pub fn start_date(mut self, token: &str) -> Self {
        self.start_date = token.to_string();
        self
    }

    /// Set the window end (negative day offset or YYYY-MM-DD).
    pub fn end_date(mut self, token: &str) -> Self {
        self.end_date = token.to_string();
        self
    }

    /// Cap the number of result rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Count downloads from every installer, not just pip.
    pub fn all_installers(mut self) -> Self {
        self.all_installers = true;
        self
    }

    /// Compose the SQL text. Fails on an invalid date token before any text
    /// is produced.
    pub fn build(&self) -> Result<String> {
        let start = format_date(&self.start_date, START_TIMESTAMP)?;
        let end = format_date(&self.end_date, END_TIMESTAMP)?;

        let mut sql = String::from("SELECT\n");
        for field in &self.fields {
            sql.push_str(&format!("  {} AS {},\n", field.expression(), field.name()));
        }
        sql.push_str("  COUNT(*) AS download_count\n");
        sql.push_str(&format!("FROM {}\n", FROM_TABLE));
        sql.push_str(&format!("WHERE timestamp BETWEEN {} AND {}\n", start, end));
        if let Some(project) = &self.project {
            sql.push_str(&format!("  AND file.project = \"{}\"\n", project));
        }
        if !self.all_installers {
            sql.push_str("  AND details.installer.name = \"pip\"\n");
        }
        if !self.fields.is_empty() {
            let names: Vec<&str> = self.fields.iter().map(|field| field.name()).collect();
            sql.push_str(&format!("GROUP BY {}\n", names.join(", ")));
            sql.push_str("ORDER BY download_count DESC\n");
        }
        sql.push_str(&format!("LIMIT {}", self.limit));

        Ok(sql)
    }
}
