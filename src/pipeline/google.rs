//! Google API clients for the pipeline
//!
//! Direct HTTP via reqwest:
//! - OAuth2 tokens from a service-account key or a refresh token
//! - BigQuery `jobs.query` for the analytics and ads tables
//! - Drive file search to resolve the spreadsheet by name
//! - Sheets `values.update` for single-cell writes

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::sheets::{CellValue, SheetWriter};
use super::sources::{ads_query, ga4_query, AdsDailyRow, AnalyticsSource, GaDailyRow};
use super::PipelineError;
use crate::config::PipelineConfig;

const BIGQUERY_API: &str = "https://bigquery.googleapis.com/bigquery/v2";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Access tokens are refreshed once they are older than this
const TOKEN_MAX_AGE: Duration = Duration::from_secs(50 * 60);

/// BigQuery server-side wait for a query to finish
const QUERY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// Credentials
// ============================================================================

/// OAuth scopes requested for service-account tokens
const SERVICE_ACCOUNT_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/bigquery",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed service-account assertion, in seconds
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Credentials file contents
///
/// Either a service-account key (`client_email` + `private_key`), a refresh
/// token with client id, or a ready access token (`token`).
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// How an access token is obtained from a credentials file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ServiceAccount,
    RefreshToken,
    StaticToken,
}

/// Claims of a service-account token assertion
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl GoogleCredentials {
    pub fn from_file(path: &std::path::Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::Credentials(format!(
                "credentials file not found: {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Service-account keys win over refresh tokens, which win over a static token
    pub fn kind(&self) -> Result<CredentialKind, PipelineError> {
        let has_key = self.client_email.is_some() && self.private_key.is_some();
        if self.kind.as_deref() == Some("service_account") || has_key {
            if !has_key {
                return Err(PipelineError::Credentials(
                    "service account key requires client_email and private_key".to_string(),
                ));
            }
            return Ok(CredentialKind::ServiceAccount);
        }
        if self.refresh_token.is_some() {
            return Ok(CredentialKind::RefreshToken);
        }
        if self.token.is_some() {
            return Ok(CredentialKind::StaticToken);
        }
        Err(PipelineError::Credentials(
            "no service account key, refresh_token or token in credentials file".to_string(),
        ))
    }

    /// Signed RS256 assertion for the JWT bearer grant, issued at `now`
    fn service_account_assertion(&self, now: i64) -> Result<String, PipelineError> {
        let (Some(client_email), Some(private_key)) =
            (self.client_email.as_deref(), self.private_key.as_deref())
        else {
            return Err(PipelineError::Credentials(
                "service account key requires client_email and private_key".to_string(),
            ));
        };

        let claims = AssertionClaims {
            iss: client_email,
            scope: SERVICE_ACCOUNT_SCOPES.join(" "),
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| PipelineError::Credentials(format!("invalid private_key: {}", e)))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| PipelineError::Credentials(format!("cannot sign token assertion: {}", e)))
    }
}

#[derive(Debug, Clone)]
struct AuthorizedToken {
    project_id: String,
    access_token: String,
    obtained_at: Instant,
}

/// Authenticated session shared by the BigQuery source and the Sheets writer
#[derive(Clone)]
pub struct GoogleSession {
    http: reqwest::Client,
    credentials_path: PathBuf,
    token: Arc<Mutex<Option<AuthorizedToken>>>,
}

impl GoogleSession {
    pub fn new(credentials_path: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials_path,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Load credentials and obtain an access token, reusing a fresh one
    async fn authorize(&self) -> Result<AuthorizedToken, PipelineError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.obtained_at.elapsed() < TOKEN_MAX_AGE {
                return Ok(token.clone());
            }
        }

        let credentials = GoogleCredentials::from_file(&self.credentials_path)?;
        let access_token = match credentials.kind()? {
            CredentialKind::ServiceAccount => self.service_account_token(&credentials).await?,
            CredentialKind::RefreshToken => self.refresh_access_token(&credentials).await?,
            CredentialKind::StaticToken => credentials.token.clone().unwrap_or_default(),
        };

        let token = AuthorizedToken {
            project_id: credentials.project_id,
            access_token,
            obtained_at: Instant::now(),
        };
        tracing::info!("Clients initialized successfully");
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn service_account_token(&self, credentials: &GoogleCredentials) -> Result<String, PipelineError> {
        let assertion = credentials.service_account_assertion(chrono::Utc::now().timestamp())?;
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let resp = self.http.post(&credentials.token_uri).form(&form).send().await?;
        let body: serde_json::Value = check_status(resp).await?.json().await?;
        access_token_from(&body)
    }

    async fn refresh_access_token(&self, credentials: &GoogleCredentials) -> Result<String, PipelineError> {
        let refresh_token = credentials.refresh_token.as_deref().unwrap_or_default();
        let client_id = credentials.client_id.as_deref().ok_or_else(|| {
            PipelineError::Credentials("refresh_token requires client_id".to_string())
        })?;

        let mut form = vec![
            ("client_id", client_id),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = credentials.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let resp = self.http.post(&credentials.token_uri).form(&form).send().await?;
        let body: serde_json::Value = check_status(resp).await?.json().await?;
        access_token_from(&body)
    }
}

fn access_token_from(body: &serde_json::Value) -> Result<String, PipelineError> {
    body["access_token"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| PipelineError::Credentials("no access_token in token response".to_string()))
}

/// Turn a non-success response into `PipelineError::Api`
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, PipelineError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(PipelineError::Api {
        status: status.as_u16(),
        message,
    })
}

// ============================================================================
// BigQuery
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: Option<serde_json::Value>,
}

/// One result row, addressable by column name
#[derive(Debug)]
pub struct QueryRow {
    values: HashMap<String, Option<String>>,
}

impl QueryRow {
    fn raw(&self, name: &str) -> Result<Option<&str>, PipelineError> {
        self.values
            .get(name)
            .map(|v| v.as_deref())
            .ok_or_else(|| PipelineError::Decode(format!("missing column '{}'", name)))
    }

    /// Required, non-null column
    pub fn get<T: std::str::FromStr>(&self, name: &str) -> Result<T, PipelineError> {
        self.get_opt(name)?
            .ok_or_else(|| PipelineError::Decode(format!("null value in column '{}'", name)))
    }

    /// Nullable column
    pub fn get_opt<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, PipelineError> {
        match self.raw(name)? {
            None => Ok(None),
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|_| PipelineError::Decode(format!("bad value '{}' in column '{}'", text, name))),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, PipelineError> {
        let text: String = self.get(name)?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|_| PipelineError::Decode(format!("bad date '{}' in column '{}'", text, name)))
    }
}

/// Decode a `jobs.query` response body into named rows
fn decode_query_response(body: serde_json::Value) -> Result<Vec<QueryRow>, PipelineError> {
    let response: QueryResponse = serde_json::from_value(body)?;
    if !response.job_complete {
        return Err(PipelineError::Decode("query did not complete in time".to_string()));
    }
    let Some(schema) = response.schema else {
        return Ok(Vec::new());
    };

    let names: Vec<String> = schema.fields.into_iter().map(|f| f.name).collect();
    response
        .rows
        .into_iter()
        .map(|row| {
            if row.f.len() != names.len() {
                return Err(PipelineError::Decode(format!(
                    "row has {} cells, schema has {}",
                    row.f.len(),
                    names.len()
                )));
            }
            let values = names
                .iter()
                .cloned()
                .zip(row.f.into_iter().map(|cell| match cell.v {
                    None | Some(serde_json::Value::Null) => None,
                    Some(serde_json::Value::String(s)) => Some(s),
                    Some(other) => Some(other.to_string()),
                }))
                .collect();
            Ok(QueryRow { values })
        })
        .collect()
}

fn ga_row(row: &QueryRow) -> Result<GaDailyRow, PipelineError> {
    Ok(GaDailyRow {
        date: row.date("date")?,
        users: row.get("users")?,
        sessions: row.get("sessions")?,
        avg_session_duration: row.get_opt("avg_session_duration")?.unwrap_or(0.0),
        conversion_rate: row.get_opt("conversion_rate")?.unwrap_or(0.0),
    })
}

fn ads_row(row: &QueryRow) -> Result<AdsDailyRow, PipelineError> {
    Ok(AdsDailyRow {
        date: row.date("date")?,
        campaign_name: row.get("campaign_name")?,
        impressions: row.get_opt("impressions")?.unwrap_or(0),
        clicks: row.get_opt("clicks")?.unwrap_or(0),
        cost: row.get_opt("cost")?.unwrap_or(0.0),
        conversions: row.get_opt("conversions")?.unwrap_or(0.0),
        cpa: row.get_opt("cpa")?,
    })
}

/// Analytics warehouse source backed by BigQuery
pub struct BigQuerySource {
    session: GoogleSession,
    events_table: String,
    ads_table: String,
    window_days: u32,
}

impl BigQuerySource {
    pub fn new(session: GoogleSession, config: &PipelineConfig) -> Self {
        Self {
            session,
            events_table: config.events_table.clone(),
            ads_table: config.ads_table.clone(),
            window_days: config.window_days,
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<QueryRow>, PipelineError> {
        let token = self.session.authorize().await?;
        let url = format!("{}/projects/{}/queries", BIGQUERY_API, token.project_id);

        let resp = self
            .session
            .http
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&serde_json::json!({
                "query": sql,
                "useLegacySql": false,
                "timeoutMs": QUERY_TIMEOUT_MS,
            }))
            .send()
            .await?;

        let body: serde_json::Value = check_status(resp).await?.json().await?;
        decode_query_response(body)
    }
}

#[async_trait]
impl AnalyticsSource for BigQuerySource {
    async fn initialize(&self) -> Result<(), PipelineError> {
        self.session.authorize().await.map(|_| ())
    }

    async fn fetch_ga4_data(&self) -> Result<Vec<GaDailyRow>, PipelineError> {
        let rows = self.query(&ga4_query(&self.events_table, self.window_days)).await?;
        rows.iter().map(ga_row).collect()
    }

    async fn fetch_ads_data(&self) -> Result<Vec<AdsDailyRow>, PipelineError> {
        let rows = self.query(&ads_query(&self.ads_table, self.window_days)).await?;
        rows.iter().map(ads_row).collect()
    }
}

// ============================================================================
// Sheets
// ============================================================================

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

/// Drive search expression for a spreadsheet with an exact name
fn spreadsheet_search_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

/// A1 range for a single cell of a worksheet, quoted for names with spaces
fn cell_range(worksheet: &str, cell: &str) -> String {
    format!("'{}'!{}", worksheet.replace('\'', "''"), cell)
}

/// KPI worksheet writer backed by the Sheets API
pub struct GoogleSheetWriter {
    session: GoogleSession,
    spreadsheet: String,
    worksheet: String,
    spreadsheet_id: Mutex<Option<String>>,
}

impl GoogleSheetWriter {
    pub fn new(session: GoogleSession, config: &PipelineConfig) -> Self {
        Self {
            session,
            spreadsheet: config.spreadsheet.clone(),
            worksheet: config.worksheet.clone(),
            spreadsheet_id: Mutex::new(None),
        }
    }

    async fn resolve_spreadsheet_id(&self, access_token: &str) -> Result<String, PipelineError> {
        let resp = self
            .session
            .http
            .get(DRIVE_FILES_API)
            .bearer_auth(access_token)
            .query(&[
                ("q", spreadsheet_search_query(&self.spreadsheet)),
                ("fields", "files(id,name)".to_string()),
            ])
            .send()
            .await?;

        let list: DriveFileList = check_status(resp).await?.json().await?;
        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| PipelineError::NotFound(format!("spreadsheet '{}'", self.spreadsheet)))
    }

    async fn spreadsheet_id(&self, access_token: &str) -> Result<String, PipelineError> {
        let mut guard = self.spreadsheet_id.lock().await;
        if let Some(id) = guard.as_ref() {
            return Ok(id.clone());
        }
        let id = self.resolve_spreadsheet_id(access_token).await?;
        *guard = Some(id.clone());
        Ok(id)
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetWriter {
    async fn initialize(&self) -> Result<(), PipelineError> {
        let token = self.session.authorize().await?;
        self.spreadsheet_id(&token.access_token).await.map(|_| ())
    }

    async fn update_cell(&self, cell: &str, value: CellValue) -> Result<(), PipelineError> {
        let token = self.session.authorize().await?;
        let id = self.spreadsheet_id(&token.access_token).await?;
        let range = cell_range(&self.worksheet, cell);
        let url = format!("{}/{}/values/{}", SHEETS_API, id, urlencoding::encode(&range));

        let resp = self
            .session
            .http
            .put(&url)
            .bearer_auth(&token.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;

        check_status(resp).await?;
        tracing::debug!("Updated {} = {}", range, value);
        Ok(())
    }
}
