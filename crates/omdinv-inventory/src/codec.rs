//! Livestatus response decoding
//!
//! The decode mode always follows the query that was sent; the response body
//! is never sniffed.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::ProtocolError;
use crate::query::{FIELD_SEPARATOR, LIST_SEPARATOR, ResponseEncoding, queries};
use crate::types::HostRecord;

/// Row shape of the structured host query
type StructuredRow = (String, String, String, Vec<String>, BTreeMap<String, String>);

/// Decode a hosts response in the given encoding
///
/// # Errors
/// Returns `ProtocolError` if the body does not match the encoding
pub fn decode_hosts(
    response: &str,
    encoding: ResponseEncoding,
) -> Result<Vec<HostRecord>, ProtocolError> {
    let hosts = match encoding {
        ResponseEncoding::Delimited => decode_delimited(response)?,
        ResponseEncoding::Structured => decode_structured(response)?,
    };

    debug!(rows = hosts.len(), ?encoding, "decoded hosts");
    Ok(hosts)
}

/// Decode `address;name;alias;group1,group2` lines
///
/// # Errors
/// Returns `ProtocolError::FieldCount` for a line with the wrong number of fields
pub fn decode_delimited(response: &str) -> Result<Vec<HostRecord>, ProtocolError> {
    let expected = queries::HOST_COLUMNS.len();
    let mut hosts = Vec::new();

    for (idx, line) in response.lines().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [address, name, alias, groups] = fields[..] else {
            return Err(ProtocolError::FieldCount {
                line: idx + 1,
                expected,
                found: fields.len(),
            });
        };

        hosts.push(HostRecord::new(address, name, alias).with_groups(split_list(groups)));
    }

    Ok(hosts)
}

/// Decode a JSON array of `[address, name, alias, [groups], {custom vars}]` rows
///
/// # Errors
/// Returns `ProtocolError::InvalidJson` if the body is not a JSON array and
/// `ProtocolError::InvalidRow` if a row has the wrong shape
pub fn decode_structured(response: &str) -> Result<Vec<HostRecord>, ProtocolError> {
    if response.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Value> =
        serde_json::from_str(response).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let mut hosts = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let (address, name, alias, groups, custom_variables): StructuredRow =
            serde_json::from_value(row).map_err(|e| ProtocolError::InvalidRow {
                row: idx,
                reason: e.to_string(),
            })?;

        hosts.push(HostRecord {
            address,
            name,
            alias,
            groups,
            custom_variables,
        });
    }

    Ok(hosts)
}

/// Split a list-valued CSV column, dropping empty items
fn split_list(field: &str) -> Vec<String> {
    field
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
