// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use docket_app::{DateRange, Record, RecordId, format_iso_date};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Blocking client for the records API.
///
/// `GET {base}/records?startDate=&endDate=` lists records in a date range
/// (either bound may be omitted); `GET {base}/records/{id}` fetches one, with
/// 404 meaning the record is gone.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;
        if parsed.cannot_be_a_base() {
            bail!("server.base_url {base_url:?} cannot carry a path; use http(s)://host[/prefix]");
        }
        if timeout.is_zero() {
            bail!("server.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn records_url(&self, range: DateRange) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/records", self.base_url))
            .with_context(|| format!("build records URL from {}", self.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(start) = range.start {
                query.append_pair("startDate", &format_iso_date(start));
            }
            if let Some(end) = range.end {
                query.append_pair("endDate", &format_iso_date(end));
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    pub fn record_url(&self, id: RecordId) -> Result<Url> {
        Url::parse(&format!("{}/records/{id}", self.base_url))
            .with_context(|| format!("build record URL from {}", self.base_url))
    }

    pub fn fetch_records(&self, range: DateRange) -> Result<Vec<Record>> {
        let url = self.records_url(range)?;
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: RecordsEnvelope = response.json().context("decode record list")?;
        Ok(parsed.into_records())
    }

    pub fn fetch_record(&self, id: RecordId) -> Result<Option<Record>> {
        let url = self.record_url(id)?;
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: RecordEnvelope = response
            .json()
            .with_context(|| format!("decode record {id}"))?;
        Ok(Some(parsed.into_record()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsEnvelope {
    Bare(Vec<Record>),
    Wrapped { data: Vec<Record> },
}

impl RecordsEnvelope {
    fn into_records(self) -> Vec<Record> {
        match self {
            Self::Bare(records) | Self::Wrapped { data: records } => records,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordEnvelope {
    Wrapped { data: Record },
    Bare(Record),
}

impl RecordEnvelope {
    fn into_record(self) -> Record {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Text(String),
    Detailed { message: String },
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("{base_url} timed out -- raise [server].timeout or check the server ({error})");
    }
    anyhow!("cannot reach {base_url} -- check [server].base_url and that the server is running ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = match parsed.error {
            Some(ErrorBody::Text(text)) => Some(text),
            Some(ErrorBody::Detailed { message }) => Some(message),
            None => parsed.message,
        };
        if let Some(message) = message.filter(|message| !message.is_empty()) {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}
