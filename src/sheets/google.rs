//! Google Sheets v4 REST client.
//!
//! Requests carry a bearer token obtained when the client is opened. The key
//! file is normally a service-account key, exchanged for a token with the
//! spreadsheets scope. A file holding a token minted elsewhere (raw, or a JSON
//! token response with `access_token`) is used as is.

use super::{SheetsApi, Worksheet, a1_range};
use crate::error::{Error, Result};
use crate::utils::truncate_for_log;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, error, info, instrument};

const API_ROOT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetInfo {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl From<SheetProperties> for Worksheet {
    fn from(p: SheetProperties) -> Self {
        Worksheet {
            id: p.sheet_id,
            title: p.title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

pub struct GoogleSheets {
    client: Client,
    doc_id: String,
    token: String,
}

impl std::fmt::Debug for GoogleSheets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheets")
            .field("doc_id", &self.doc_id)
            .finish()
    }
}

/// What a key file holds.
#[derive(Debug, PartialEq, Eq)]
enum Credentials {
    /// Service-account key JSON, exchanged for a token on open.
    ServiceAccount(String),
    /// Access token minted elsewhere.
    Token(String),
}

fn read_credentials(contents: &str) -> Result<Credentials> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("key file is empty".to_string()));
    }
    if !trimmed.starts_with('{') {
        return Ok(Credentials::Token(trimmed.to_string()));
    }

    let value: Value = serde_json::from_str(trimmed)?;
    if value.get("type").and_then(Value::as_str) == Some("service_account") {
        return Ok(Credentials::ServiceAccount(trimmed.to_string()));
    }
    value
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(|token| Credentials::Token(token.to_string()))
        .ok_or_else(|| {
            Error::Config("key file is neither a service-account key nor a token".to_string())
        })
}

async fn authorize(credentials: Credentials) -> Result<String> {
    match credentials {
        Credentials::Token(token) => Ok(token),
        Credentials::ServiceAccount(key) => {
            let account = CustomServiceAccount::from_json(&key)?;
            let token = account.token(&[SPREADSHEETS_SCOPE]).await?;
            debug!(scope = SPREADSHEETS_SCOPE, "Obtained service-account token");
            Ok(token.as_str().to_string())
        }
    }
}

fn delete_sheet_request(sheet: &Worksheet) -> Value {
    json!({ "deleteSheet": { "sheetId": sheet.id } })
}

fn add_sheet_request(title: &str, rows: u32, columns: u32) -> Value {
    json!({
        "addSheet": {
            "properties": {
                "title": title,
                "gridProperties": { "rowCount": rows, "columnCount": columns }
            }
        }
    })
}

/// Requests for one atomic `batchUpdate`: every deletion, then every rename.
///
/// Deleting first frees the final titles before staged sheets take them.
fn swap_requests(remove: &[Worksheet], rename: &[(Worksheet, String)]) -> Vec<Value> {
    remove
        .iter()
        .map(delete_sheet_request)
        .chain(rename.iter().map(|(sheet, title)| {
            json!({
                "updateSheetProperties": {
                    "properties": { "sheetId": sheet.id, "title": title },
                    "fields": "title"
                }
            })
        }))
        .collect()
}

/// Path suffix and body of a values update covering `range`.
///
/// Values go in as `USER_ENTERED` so `=HYPERLINK(...)` cells become formulas.
fn values_request(range: &str, rows: &[Vec<String>]) -> (String, Value) {
    let suffix = format!(
        "/values/{}?valueInputOption=USER_ENTERED",
        urlencoding::encode(range)
    );
    let body = json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": rows,
    });
    (suffix, body)
}

impl GoogleSheets {
    pub fn new(client: Client, doc_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            doc_id: doc_id.into(),
            token: token.into(),
        }
    }

    /// Open a spreadsheet with the credentials in `key_file`.
    #[instrument(level = "info", skip(client), fields(key_file = %key_file.display()))]
    pub async fn open(client: Client, key_file: &Path, doc_id: &str) -> Result<Self> {
        let contents = tokio::fs::read_to_string(key_file)
            .await
            .map_err(|e| Error::Config(format!("cannot read key file {}: {e}", key_file.display())))?;
        let credentials = read_credentials(&contents)?;
        let service_account = matches!(credentials, Credentials::ServiceAccount(_));
        let token = authorize(credentials).await?;
        info!(service_account, "Loaded spreadsheet credentials");
        Ok(Self::new(client, doc_id, token))
    }

    fn url(&self, suffix: &str) -> String {
        format!("{API_ROOT}/{}{suffix}", self.doc_id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), body = %truncate_for_log(&body, 300), "Spreadsheet API call failed");
            return Err(Error::Sheets {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn batch_update(&self, requests: Vec<Value>) -> Result<BatchUpdateResponse> {
        let request = self
            .client
            .post(self.url(":batchUpdate"))
            .json(&json!({ "requests": requests }));
        Ok(serde_json::from_value(self.send(request).await?)?)
    }
}

impl SheetsApi for GoogleSheets {
    async fn worksheets(&self) -> Result<Vec<Worksheet>> {
        let request = self
            .client
            .get(self.url(""))
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let info: SpreadsheetInfo = serde_json::from_value(self.send(request).await?)?;
        Ok(info.sheets.into_iter().map(|s| s.properties.into()).collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn add_worksheet(&self, title: &str, rows: u32, columns: u32) -> Result<Worksheet> {
        let response = self
            .batch_update(vec![add_sheet_request(title, rows, columns)])
            .await?;

        let properties = response
            .replies
            .into_iter()
            .next()
            .and_then(|mut reply| reply.pointer_mut("/addSheet/properties").map(Value::take))
            .ok_or_else(|| Error::Sheets {
                status: 200,
                body: "addSheet reply without properties".to_string(),
            })?;
        let properties: SheetProperties = serde_json::from_value(properties)?;
        Ok(properties.into())
    }

    async fn write_rows(&self, sheet: &Worksheet, first_row: u32, rows: &[Vec<String>]) -> Result<()> {
        let range = a1_range(&sheet.title, first_row, rows);
        debug!(%range, rows = rows.len(), "Writing values");
        let (suffix, body) = values_request(&range, rows);
        let request = self.client.put(self.url(&suffix)).json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn swap(&self, remove: &[Worksheet], rename: &[(Worksheet, String)]) -> Result<()> {
        let requests = swap_requests(remove, rename);
        if requests.is_empty() {
            return Ok(());
        }
        self.batch_update(requests).await?;
        Ok(())
    }

    async fn delete_worksheets(&self, sheets: &[Worksheet]) -> Result<()> {
        if sheets.is_empty() {
            return Ok(());
        }
        self.batch_update(sheets.iter().map(delete_sheet_request).collect())
            .await?;
        Ok(())
    }
}
