//! Reqwest-backed catalog source.
//!
//! # Responsibility
//! - Own transport details: URL building, timeout, status mapping and JSON
//!   decoding into domain types.
//!
//! # Invariants
//! - Base URL always ends with `/` so relative joins append segments.
//! - Detail references must be absolute `http(s)` URLs.

use super::dto::{CatalogPageDto, EntityDetailsDto};
use super::{CatalogError, CatalogSource};
use crate::model::entity::{CatalogPage, EntityDetails};
use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

const LIST_PATH: &str = "pokemon";
const USER_AGENT: &str = concat!("pokecapture/", env!("CARGO_PKG_VERSION"));
const BODY_PREVIEW_CHARS: usize = 160;

/// Catalog source performing HTTP GET requests against one REST catalog.
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
}

impl HttpCatalogSource {
    /// Builds a source with an explicit request timeout.
    ///
    /// # Errors
    /// - `InvalidReference` when `base_url` is not an absolute http(s) URL.
    /// - `Transport` when the reqwest client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| CatalogError::Transport(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        event: &'static str,
    ) -> Result<T, CatalogError> {
        let started_at = Instant::now();
        info!("event={event} module=catalog status=start");

        let result = self.send_and_decode(url).await;
        match &result {
            Ok(_) => info!(
                "event={event} module=catalog status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=catalog status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        decode_json(body.as_ref())
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_first_page(&self) -> Result<CatalogPage, CatalogError> {
        let url = self
            .base_url
            .join(LIST_PATH)
            .map_err(|err| CatalogError::InvalidReference(err.to_string()))?;
        let page: CatalogPageDto = self.get_json(url, "catalog_fetch").await?;
        Ok(page.into_domain())
    }

    async fn fetch_page(&self, cursor: &str) -> Result<CatalogPage, CatalogError> {
        let url = parse_reference(cursor)?;
        let page: CatalogPageDto = self.get_json(url, "catalog_fetch_page").await?;
        Ok(page.into_domain())
    }

    async fn fetch_details(&self, detail_reference: &str) -> Result<EntityDetails, CatalogError> {
        let url = parse_reference(detail_reference)?;
        let details: EntityDetailsDto = self.get_json(url, "catalog_details").await?;
        Ok(details.into_domain())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, CatalogError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    parse_reference(&with_slash)
}

fn parse_reference(raw: &str) -> Result<Url, CatalogError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| CatalogError::InvalidReference(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(CatalogError::InvalidReference(raw.to_string())),
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, CatalogError> {
    serde_json::from_slice(body).map_err(|err| CatalogError::Decode(err.to_string()))
}

fn map_transport_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout(err.to_string())
    } else {
        CatalogError::Transport(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CatalogError {
    CatalogError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut preview = compact.chars().take(BODY_PREVIEW_CHARS).collect::<String>();
    if compact.chars().count() > BODY_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
