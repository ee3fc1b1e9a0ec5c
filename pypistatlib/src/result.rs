//! Loading saved query results.
//!
//! The query service answers with a JSON document carrying the result schema,
//! row values, and billing statistics. This module parses that shape (key
//! names are the service's, preserved verbatim) into a [`QueryInfo`] plus a
//! [`DownloadTable`] ready for enrichment and rendering.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PypistatError;
use crate::table::DownloadTable;
use crate::Result;

/// On-demand query pricing: dollars per 2^40 bytes billed.
const DOLLARS_PER_TIB: u128 = 5;

/// Billing and cache statistics for one executed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Bytes the service billed for.
    pub bytes_billed: u64,
    /// Bytes the query actually scanned.
    pub bytes_processed: u64,
    /// Whether the result was served from the query cache.
    pub cached: bool,
    /// Billed cost in dollars, rounded up to the cent (`"0.04"`, never a float).
    pub estimated_cost: String,
}

/// Wire shape of a saved query result. Field names belong to the service.
#[derive(Debug, Deserialize)]
struct ResultPayload {
    schema: ResultSchema,
    #[serde(default)]
    rows: Vec<ResultRow>,
    #[serde(rename = "totalBytesBilled", deserialize_with = "int64_field")]
    total_bytes_billed: u64,
    #[serde(rename = "totalBytesProcessed", deserialize_with = "int64_field")]
    total_bytes_processed: u64,
    #[serde(rename = "cacheHit")]
    cache_hit: bool,
}

#[derive(Debug, Deserialize)]
struct ResultSchema {
    fields: Vec<SchemaField>,
}

#[derive(Debug, Deserialize)]
struct SchemaField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    f: Vec<ResultCell>,
}

#[derive(Debug, Deserialize)]
struct ResultCell {
    #[serde(default)]
    v: Value,
}

/// The service encodes int64 statistics as decimal strings; plain numbers are
/// accepted too for hand-written fixtures.
fn int64_field<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse::<u64>().map_err(D::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom("expected a non-negative integer")),
        other => Err(D::Error::custom(format!(
            "expected an int64 value, got {}",
            other
        ))),
    }
}

/// Render one result cell the way the report prints it.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Parse a query-result document from its JSON text.
pub fn parse_json(contents: &str) -> Result<(QueryInfo, DownloadTable)> {
    let payload: ResultPayload = serde_json::from_str(contents)
        .map_err(|err| PypistatError::MalformedResult(err.to_string()))?;

    let header: Vec<String> = payload
        .schema
        .fields
        .into_iter()
        .map(|field| field.name)
        .collect();

    let mut rows = Vec::with_capacity(payload.rows.len());
    for row in &payload.rows {
        if row.f.len() != header.len() {
            return Err(PypistatError::MalformedResult(format!(
                "row has {} values, expected {}",
                row.f.len(),
                header.len()
            )));
        }
        rows.push(row.f.iter().map(|cell| display_value(&cell.v)).collect());
    }

    let info = QueryInfo {
        bytes_billed: payload.total_bytes_billed,
        bytes_processed: payload.total_bytes_processed,
        cached: payload.cache_hit,
        estimated_cost: estimated_cost(payload.total_bytes_billed),
    };

    Ok((info, DownloadTable { header, rows }))
}

/// Load a saved query result from `path`.
pub fn load_json_from_file(path: impl AsRef<Path>) -> Result<(QueryInfo, DownloadTable)> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| PypistatError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&contents)
}

/// Billed cost in dollars, rounded up to the cent.
fn estimated_cost(bytes_billed: u64) -> String {
    const TIB: u128 = 1 << 40;
    let cents = (bytes_billed as u128 * DOLLARS_PER_TIB * 100).div_ceil(TIB);
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Render a byte count with binary units (`6.74 GiB`).
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PYTHON_VERSION_RESULT: &str = r#"{
        "schema": {
            "fields": [
                { "name": "python_version", "type": "STRING" },
                { "name": "download_count", "type": "INTEGER" }
            ]
        },
        "rows": [
            { "f": [ { "v": "2.7" }, { "v": "330231255" } ] },
            { "f": [ { "v": "3.6" }, { "v": "116093128" } ] },
            { "f": [ { "v": "3.5" }, { "v": "45672661" } ] },
            { "f": [ { "v": "3.4" }, { "v": "13996356" } ] },
            { "f": [ { "v": "3.7" }, { "v": "7060224" } ] },
            { "f": [ { "v": "2.6" }, { "v": "1749249" } ] },
            { "f": [ { "v": "3.3" }, { "v": "145232" } ] },
            { "f": [ { "v": "3.8" }, { "v": "17111" } ] },
            { "f": [ { "v": "3.2" }, { "v": "11731" } ] },
            { "f": [ { "v": null }, { "v": "9951" } ] },
            { "f": [ { "v": "3.1" }, { "v": "79" } ] },
            { "f": [ { "v": "2.8" }, { "v": "37" } ] }
        ],
        "totalBytesBilled": "7242514432",
        "totalBytesProcessed": "7242430447",
        "cacheHit": false
    }"#;

    const DISTRO_SYSTEM_RESULT: &str = r#"{
        "schema": {
            "fields": [
                { "name": "distro_name", "type": "STRING" },
                { "name": "system_name", "type": "STRING" },
                { "name": "download_count", "type": "INTEGER" }
            ]
        },
        "rows": [
            { "f": [ { "v": "Ubuntu" }, { "v": "Linux" }, { "v": "3753805" } ] },
            { "f": [ { "v": null }, { "v": "Linux" }, { "v": "1356305" } ] },
            { "f": [ { "v": "Debian GNU/Linux" }, { "v": "Linux" }, { "v": "1284028" } ] },
            { "f": [ { "v": "macOS" }, { "v": "Darwin" }, { "v": "881647" } ] },
            { "f": [ { "v": null }, { "v": "Windows" }, { "v": "460407" } ] }
        ],
        "totalBytesBilled": "53529804800",
        "totalBytesProcessed": "53529093431",
        "cacheHit": false
    }"#;

    #[test]
    fn test_parse_json_python_version() {
        let (info, table) = parse_json(PYTHON_VERSION_RESULT).unwrap();

        assert_eq!(
            info,
            QueryInfo {
                bytes_billed: 7242514432,
                bytes_processed: 7242430447,
                cached: false,
                estimated_cost: "0.04".to_string(),
            }
        );
        assert_eq!(table.header, vec!["python_version", "download_count"]);
        assert_eq!(table.rows.len(), 12);
        assert_eq!(table.rows[0], vec!["2.7", "330231255"]);
        assert_eq!(table.rows[9], vec!["None", "9951"]);
        assert_eq!(table.rows[11], vec!["2.8", "37"]);
    }

    #[test]
    fn test_parse_json_distro_system() {
        let (info, table) = parse_json(DISTRO_SYSTEM_RESULT).unwrap();

        assert_eq!(info.bytes_billed, 53529804800);
        assert_eq!(info.estimated_cost, "0.25");
        assert!(!info.cached);
        assert_eq!(
            table.header,
            vec!["distro_name", "system_name", "download_count"]
        );
        assert_eq!(table.rows[0], vec!["Ubuntu", "Linux", "3753805"]);
        assert_eq!(table.rows[4], vec!["None", "Windows", "460407"]);
    }

    #[test]
    fn test_parse_json_numeric_statistics() {
        // Hand-written fixtures often use plain numbers instead of the
        // service's int64-as-string encoding.
        let contents = r#"{
            "schema": { "fields": [ { "name": "download_count" } ] },
            "rows": [ { "f": [ { "v": "5" } ] } ],
            "totalBytesBilled": 1099511627776,
            "totalBytesProcessed": 1099511627776,
            "cacheHit": true
        }"#;

        let (info, table) = parse_json(contents).unwrap();
        assert!(info.cached);
        assert_eq!(info.estimated_cost, "5.00");
        assert_eq!(table.rows, vec![vec!["5".to_string()]]);
    }

    #[test]
    fn test_parse_json_missing_schema() {
        let contents = r#"{
            "rows": [],
            "totalBytesBilled": "0",
            "totalBytesProcessed": "0",
            "cacheHit": false
        }"#;

        assert!(matches!(
            parse_json(contents),
            Err(PypistatError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_parse_json_missing_statistics() {
        let contents = r#"{
            "schema": { "fields": [ { "name": "download_count" } ] },
            "rows": []
        }"#;

        assert!(matches!(
            parse_json(contents),
            Err(PypistatError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_parse_json_ragged_row() {
        let contents = r#"{
            "schema": { "fields": [ { "name": "a" }, { "name": "download_count" } ] },
            "rows": [ { "f": [ { "v": "only one" } ] } ],
            "totalBytesBilled": "0",
            "totalBytesProcessed": "0",
            "cacheHit": false
        }"#;

        assert!(matches!(
            parse_json(contents),
            Err(PypistatError::MalformedResult(_))
        ));
    }

    #[test]
    fn test_load_json_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PYTHON_VERSION_RESULT.as_bytes()).unwrap();

        let (info, table) = load_json_from_file(file.path()).unwrap();
        assert_eq!(info.estimated_cost, "0.04");
        assert_eq!(table.rows.len(), 12);
    }

    #[test]
    fn test_load_json_from_missing_file() {
        let result = load_json_from_file("/nonexistent/result.json");
        assert!(matches!(result, Err(PypistatError::FileRead { .. })));
    }

    #[test]
    fn test_estimated_cost_rounds_up() {
        assert_eq!(estimated_cost(0), "0.00");
        // One byte still bills a whole cent.
        assert_eq!(estimated_cost(1), "0.01");
        assert_eq!(estimated_cost(7242514432), "0.04");
        assert_eq!(estimated_cost(53529804800), "0.25");
        // Exactly one TiB is exactly five dollars.
        assert_eq!(estimated_cost(1 << 40), "5.00");
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1536), "1.50 KiB");
        assert_eq!(human_bytes(21474836480), "20.00 GiB");
        assert_eq!(human_bytes(1 << 40), "1.00 TiB");
    }
}
