use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::services::{
    AdminError, ServiceResult, TransactionRecord, TransactionStatus,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000";
const PAGE_LIMIT: u32 = 100;

/// `{status, message, data}` wrapper every backend response uses.
#[derive(Debug, serde::Deserialize)]
pub struct Envelope {
    #[serde(default, alias = "statusCode")]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Copy, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub page: u32,
}

fn normalize_base_url(raw: String) -> String {
    let url = raw.trim().trim_end_matches('/').to_string();
    if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else {
        format!("http://{url}")
    }
}

/// HTTP client for the platform backend. Every request carries the bearer
/// token from the injected provider; a missing token fails closed before any
/// I/O is attempted.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Arc<dyn TokenProvider>) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AdminError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url.to_string()),
            token,
        })
    }

    /// Builds a client from `API_BASE_URL`, defaulting to a local backend.
    pub fn from_env(token: Arc<dyn TokenProvider>) -> ServiceResult<Self> {
        let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(&base_url, token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ServiceResult<Envelope> {
        let token = self.token.token().ok_or(AdminError::Unauthenticated)?;
        let url = format!("{}{path}", self.base_url);
        debug!(%url, method = %method, "dispatching backend request");

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|err| AdminError::Network(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| AdminError::Network(err.to_string()))?;

        if !status.is_success() {
            return Err(http_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|err| AdminError::Internal(format!("invalid response envelope: {err}")))
    }

    /// One backend page of transactions plus its pagination metadata.
    pub async fn transaction_page(
        &self,
        page: u32,
        limit: u32,
    ) -> ServiceResult<(Vec<TransactionRecord>, PageMeta)> {
        let envelope = self
            .send(
                Method::GET,
                &format!("/transaction?page={page}&limit={limit}"),
                None,
            )
            .await?;
        let meta = envelope
            .data
            .get("pagination")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        Ok((decode_items(envelope.data)?, meta))
    }

    /// Walks the backend pages sequentially, one awaited request at a time,
    /// until the reported pagination is exhausted.
    pub async fn fetch_all_transactions(&self) -> ServiceResult<Vec<TransactionRecord>> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let (items, meta) = self.transaction_page(page, PAGE_LIMIT).await?;
            let got_items = !items.is_empty();
            all.extend(items);
            let has_more =
                meta.has_next_page || (meta.total_pages > 0 && page < meta.total_pages);
            if !has_more || !got_items {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        status: TransactionStatus,
        amount: f64,
    ) -> ServiceResult<TransactionRecord> {
        let body = json!({ "status": status, "amount": amount });
        let envelope = self
            .send(Method::PATCH, &format!("/admin/transaction/{id}"), Some(&body))
            .await?;
        decode_record(envelope.data)
    }

    pub async fn delete_transaction(&self, id: &str) -> ServiceResult<()> {
        self.send(Method::DELETE, &format!("/transaction/{id}"), None)
            .await
            .map(|_| ())
    }

    pub async fn list_records<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<Vec<T>> {
        let envelope = self.send(Method::GET, path, None).await?;
        decode_items(envelope.data)
    }

    pub async fn create_record<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        record: &T,
    ) -> ServiceResult<T> {
        let body = serde_json::to_value(record)
            .map_err(|err| AdminError::Internal(err.to_string()))?;
        let envelope = self.send(Method::POST, path, Some(&body)).await?;
        decode_record(envelope.data)
    }

    pub async fn patch_record<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        record: &T,
    ) -> ServiceResult<T> {
        let body = serde_json::to_value(record)
            .map_err(|err| AdminError::Internal(err.to_string()))?;
        let envelope = self.send(Method::PATCH, path, Some(&body)).await?;
        decode_record(envelope.data)
    }

    pub async fn delete_record(&self, path: &str) -> ServiceResult<()> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }
}

/// Maps a non-2xx response to `Http`, preferring the envelope's own message
/// when the body parses as one.
fn http_error(status: u16, body: &str) -> AdminError {
    let message = serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| format!("request failed with status {status}"));
    AdminError::Http { status, message }
}

/// `data` is either a bare array or an object wrapping one under `items`.
fn decode_items<T: DeserializeOwned>(data: Value) -> ServiceResult<Vec<T>> {
    let items = match data {
        Value::Array(_) => data,
        Value::Object(ref map) => map
            .get("items")
            .cloned()
            .ok_or_else(|| AdminError::Internal("response data holds no item list".into()))?,
        _ => return Err(AdminError::Internal("response data holds no item list".into())),
    };
    serde_json::from_value(items)
        .map_err(|err| AdminError::Internal(format!("undecodable item list: {err}")))
}

fn decode_record<T: DeserializeOwned>(data: Value) -> ServiceResult<T> {
    serde_json::from_value(data)
        .map_err(|err| AdminError::Internal(format!("undecodable record: {err}")))
}
