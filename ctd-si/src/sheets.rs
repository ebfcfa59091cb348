//! Google Sheets source reader
//!
//! Reads every worksheet tab of the configured workbook through the Sheets
//! v4 REST API and materializes each as a table of named-column rows. The
//! API key travels only as a query parameter; it is stripped from every
//! error message.

use ctd_common::{Error, Result};
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Sheets API base URL
const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Default timeout for Sheets API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("ctd-si/", env!("CARGO_PKG_VERSION"));

/// Credentialed client for one spreadsheet. Carries the API key, so Debug
/// is not derived.
#[derive(Clone)]
pub struct SheetsClient {
    http_client: Client,
    spreadsheet_id: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsClient {
    /// Create a client for the given spreadsheet
    pub fn new(spreadsheet_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .default_headers(headers)
                .build()
                .expect("Failed to create HTTP client"),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Enumerate worksheet tab titles, in workbook order
    pub async fn list_sheet_titles(&self) -> Result<Vec<String>> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let meta: SpreadsheetMeta = self.get_json(url, "spreadsheet metadata").await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Fetch one worksheet as a table; the first row is the header
    pub async fn fetch_sheet(&self, title: &str) -> Result<SheetTable> {
        let url = self.url(&["values", title])?;
        let range: ValueRange = self.get_json(url, title).await?;

        let values = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        Ok(SheetTable::from_values(values))
    }

    /// Fetch every tab of the workbook
    pub async fn fetch_all(&self) -> Result<SheetSet> {
        let titles = self.list_sheet_titles().await?;
        let mut tabs = Vec::with_capacity(titles.len());
        for title in titles {
            let table = self.fetch_sheet(&title).await?;
            info!(
                "Sheet '{}' imported with {} rows and {} columns",
                title,
                table.row_count(),
                table.columns().len()
            );
            tabs.push((title, table));
        }
        Ok(SheetSet::new(tabs))
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_URL)
            .map_err(|e| Error::Internal(format!("Invalid Sheets API base URL: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Internal("Sheets API base URL cannot be a base".to_string()))?;
            path.push(&self.spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        // without_url: reqwest errors embed the URL, which carries the key
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request for '{what}' failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!(
                "Sheets API returned {status} for '{what}'"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Http(format!("Invalid response for '{what}': {}", e.without_url())))
    }
}

/// The Sheets API returns formatted cells, but numbers and booleans can
/// still appear as bare JSON scalars
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// One worksheet materialized as rows with named columns
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Build from raw cell rows; the first row becomes the (trimmed) header
    pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let columns = values
            .remove(0)
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();
        Self {
            columns,
            rows: values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate data rows
    pub fn rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().map(|cells| SheetRow {
            columns: &self.columns,
            cells,
        })
    }
}

/// One data row, addressable by column header
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl<'a> SheetRow<'a> {
    /// Cell under a header name. `None` when the column is unknown or the
    /// row is shorter than the header.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.cells.get(idx).map(String::as_str)
    }
}

/// All tabs of one workbook fetch, in workbook order
#[derive(Debug, Clone, Default)]
pub struct SheetSet {
    tabs: Vec<(String, SheetTable)>,
}

impl SheetSet {
    pub fn new(tabs: Vec<(String, SheetTable)>) -> Self {
        Self { tabs }
    }

    /// Look up a tab by title
    pub fn get(&self, name: &str) -> Option<&SheetTable> {
        self.tabs
            .iter()
            .find(|(title, _)| title == name)
            .map(|(_, table)| table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SheetTable)> {
        self.tabs.iter().map(|(title, table)| (title.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_from_values_splits_header() {
        let table = SheetTable::from_values(vec![
            strings(&[" ID ", "Age"]),
            strings(&["C1", "34"]),
        ]);
        assert_eq!(table.columns(), ["ID", "Age"]);
        assert_eq!(table.row_count(), 1);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("ID"), Some("C1"));
        assert_eq!(row.get("Age"), Some("34"));
    }

    #[test]
    fn test_short_rows_read_as_absent() {
        let table = SheetTable::from_values(vec![
            strings(&["ID", "Age", "Gender"]),
            strings(&["C1"]),
        ]);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("ID"), Some("C1"));
        assert_eq!(row.get("Age"), None);
        assert_eq!(row.get("Gender"), None);
    }

    #[test]
    fn test_unknown_column_is_absent() {
        let table = SheetTable::from_values(vec![strings(&["ID"]), strings(&["C1"])]);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("Missing"), None);
    }

    #[test]
    fn test_empty_sheet() {
        let table = SheetTable::from_values(Vec::new());
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_cell_to_string_scalars() {
        assert_eq!(cell_to_string(Value::String("x".to_string())), "x");
        assert_eq!(cell_to_string(serde_json::json!(67)), "67");
        assert_eq!(cell_to_string(serde_json::json!(67.5)), "67.5");
        assert_eq!(cell_to_string(Value::Null), "");
    }

    #[test]
    fn test_sheet_set_lookup() {
        let set = SheetSet::new(vec![(
            "Clients".to_string(),
            SheetTable::from_values(vec![strings(&["ID"])]),
        )]);
        assert!(set.get("Clients").is_some());
        assert!(set.get("Missing").is_none());
        assert_eq!(set.len(), 1);
    }
}
