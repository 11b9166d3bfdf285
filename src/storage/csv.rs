//! Decoder for InfluxDB query responses in CSV form
//!
//! Responses are requested with a header row and without annotations. Each
//! result table starts with its own header and tables are separated by an
//! empty line. Fields may be quoted and quoted fields may span lines.

use std::collections::HashMap;

use super::gateway::GatewayError;

/// One row of a query result, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FluxRecord {
    values: HashMap<String, String>,
}

impl FluxRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// The `_value` column, if present and non-empty
    pub fn value(&self) -> Option<&str> {
        self.get("_value").filter(|v| !v.is_empty())
    }

    /// The `_time` column, if present and non-empty
    pub fn time(&self) -> Option<&str> {
        self.get("_time").filter(|v| !v.is_empty())
    }
}

/// Decode a full response body into records, in response order
pub fn parse_records(body: &str) -> Result<Vec<FluxRecord>, GatewayError> {
    let mut records = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for row in split_rows(body)? {
        if row.iter().all(|field| field.is_empty()) {
            // Table boundary
            header = None;
            continue;
        }

        match &header {
            None => header = Some(row),
            Some(columns) => {
                if columns.iter().any(|c| c == "error") && !columns.iter().any(|c| c == "_value") {
                    let idx = columns.iter().position(|c| c == "error").unwrap_or(0);
                    let message = row.get(idx).cloned().unwrap_or_default();
                    return Err(GatewayError::Query(message));
                }

                let values = columns
                    .iter()
                    .zip(row.into_iter())
                    .filter(|(name, _)| !name.is_empty())
                    .map(|(name, value)| (name.clone(), value))
                    .collect();
                records.push(FluxRecord { values });
            }
        }
    }

    Ok(records)
}

/// Split the body into rows of fields, honouring quotes
fn split_rows(body: &str) -> Result<Vec<Vec<String>>, GatewayError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(GatewayError::Decode("unterminated quoted field".to_string()));
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}
