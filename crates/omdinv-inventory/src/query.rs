//! Livestatus query builder
//!
//! Livestatus speaks LQL: a `GET <table>` line followed by header lines and
//! terminated by an empty line.

use std::fmt;

/// Field separator of the default CSV response format
pub const FIELD_SEPARATOR: char = ';';

/// Separator inside list-valued columns of the CSV response format
pub const LIST_SEPARATOR: char = ',';

/// Response encoding requested from the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseEncoding {
    /// One line per row, `;`-separated fields (Livestatus default)
    Delimited,
    /// JSON array of row arrays (`OutputFormat: json`)
    #[default]
    Structured,
}

impl ResponseEncoding {
    /// Value of the `OutputFormat` header, if one is sent
    fn output_format(self) -> Option<&'static str> {
        match self {
            ResponseEncoding::Delimited => None,
            ResponseEncoding::Structured => Some("json"),
        }
    }
}

/// LQL query builder
#[derive(Debug, Clone)]
pub struct Query {
    /// Table to read
    table: String,
    /// Requested columns (empty means all)
    columns: Vec<String>,
    /// Response encoding
    encoding: ResponseEncoding,
}

impl Query {
    /// Create a new query for a table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            encoding: ResponseEncoding::Delimited,
        }
    }

    /// Select specific columns
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Request a response encoding
    #[must_use]
    pub fn encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of requested columns
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Build the query text
    #[must_use]
    pub fn build(&self) -> String {
        use std::fmt::Write;

        let mut lql = format!("GET {}\n", self.table);

        if !self.columns.is_empty() {
            let _ = writeln!(lql, "Columns: {}", self.columns.join(" "));
        }

        if let Some(format) = self.encoding.output_format() {
            let _ = writeln!(lql, "OutputFormat: {format}");
        }

        lql.push('\n');
        lql
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}

/// Predefined queries
pub mod queries {
    use super::{Query, ResponseEncoding};

    /// Host columns understood by both encodings
    pub const HOST_COLUMNS: &[&str] = &["address", "name", "alias", "groups"];

    /// Host columns for the structured encoding
    pub const HOST_COLUMNS_STRUCTURED: &[&str] =
        &["address", "name", "alias", "groups", "custom_variables"];

    /// Query for all hosts with their groups
    ///
    /// The delimited encoding has no way to carry a mapping, so custom
    /// variables are only requested in structured mode.
    #[must_use]
    pub fn hosts(encoding: ResponseEncoding) -> Query {
        let columns = match encoding {
            ResponseEncoding::Delimited => HOST_COLUMNS,
            ResponseEncoding::Structured => HOST_COLUMNS_STRUCTURED,
        };
        Query::new("hosts").columns(columns).encoding(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new("hosts").columns(&["name", "address"]);

        assert_eq!(query.build(), "GET hosts\nColumns: name address\n\n");
        assert_eq!(query.column_count(), 2);
    }

    #[test]
    fn test_structured_hosts_query() {
        let query = queries::hosts(ResponseEncoding::Structured);

        assert_eq!(
            query.to_string(),
            "GET hosts\n\
             Columns: address name alias groups custom_variables\n\
             OutputFormat: json\n\n"
        );
    }

    #[test]
    fn test_delimited_hosts_query() {
        let query = queries::hosts(ResponseEncoding::Delimited);
        let lql = query.build();

        assert_eq!(lql, "GET hosts\nColumns: address name alias groups\n\n");
        assert!(!lql.contains("OutputFormat"));
        assert_eq!(query.column_count(), 4);
    }

    #[test]
    fn test_query_without_columns() {
        assert_eq!(Query::new("status").build(), "GET status\n\n");
    }
}
