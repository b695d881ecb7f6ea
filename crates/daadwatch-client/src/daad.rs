//! DAAD listing API fetcher.
//!
//! Pages `search.json` with `limit`/`offset` until the service returns an
//! empty `courses` page. Any failure fails the whole fetch; a partially
//! paged catalog is never returned.

use crate::config::FetchConfig;
use crate::errors::{fetch_error, ClientError};
use daadwatch_core::errors::{ExError, ExErrorKind, Result};
use daadwatch_core::model::ProgrammeRecord;
use daadwatch_core::ports::Fetcher;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::thread;
use std::time::Duration;

/// Filter parameters the listing expects to be present, all left empty
const EMPTY_FILTERS: &[&str] = &[
    "cert",
    "admReq",
    "langExamPC",
    "langExamLC",
    "langExamSC",
    "langDeAvailable",
    "langEnAvailable",
    "fee",
    "dur",
    "q",
    "isElearning",
    "isSep",
];

/// Blocking client for the international-programmes listing.
#[derive(Clone)]
pub struct DaadFetcher {
    client: Client,
    config: FetchConfig,
}

impl DaadFetcher {
    /// Builds the HTTP client with browser-like default headers.
    ///
    /// # Errors
    ///
    /// `ClientError::Config` for an empty base URL, zero page size, or a header
    /// value that is not valid ASCII.
    pub fn new(config: FetchConfig) -> std::result::Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("fetch.base_url is empty".into()));
        }
        if config.page_size == 0 {
            return Err(ClientError::Config("fetch.page_size must be positive".into()));
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ClientError::Config("invalid fetch.user_agent".into()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer)
                .map_err(|_| ClientError::Config("invalid fetch.referer".into()))?,
        );
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Query parameters for the page starting at `offset`
    pub fn page_params(&self, offset: usize) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> =
            EMPTY_FILTERS.iter().map(|k| (*k, String::new())).collect();
        params.push(("sort", self.config.sort.to_string()));
        params.push(("limit", self.config.page_size.to_string()));
        params.push(("offset", offset.to_string()));
        params.push(("display", "list".to_string()));
        params
    }

    /// Fetch every page as raw JSON objects
    ///
    /// # Errors
    ///
    /// The first page failure, or `PageLimit` if `max_pages` pages were all
    /// non-empty.
    pub fn fetch_raw(&self) -> std::result::Result<Vec<Value>, ClientError> {
        let mut programmes = Vec::new();
        let mut offset = 0;
        for page in 0..self.config.max_pages {
            let courses = self.fetch_page(offset)?;
            tracing::debug!(page, offset, courses = courses.len(), "listing page fetched");
            if courses.is_empty() {
                return Ok(programmes);
            }
            programmes.extend(courses);
            offset += self.config.page_size;
        }
        Err(ClientError::PageLimit {
            pages: self.config.max_pages,
        })
    }

    fn fetch_page(&self, offset: usize) -> std::result::Result<Vec<Value>, ClientError> {
        let params = self.page_params(offset);
        let mut attempt = 0usize;
        loop {
            let response = self.client.get(&self.config.base_url).query(&params).send();
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body = resp.text()?;
                        return parse_page(&body);
                    }
                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.config.max_retries {
                        attempt += 1;
                        tracing::warn!(offset, status = status.as_u16(), attempt, "retrying listing page");
                        thread::sleep(self.retry_backoff(attempt));
                        continue;
                    }
                    return Err(ClientError::Status {
                        status: status.as_u16(),
                        body: truncate(&body, 200),
                    });
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt + 1 < self.config.max_retries {
                        attempt += 1;
                        tracing::warn!(offset, attempt, error = %err, "retrying listing page");
                        thread::sleep(self.retry_backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn retry_backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(self.config.retry_backoff_ms * (1 << capped))
    }
}

impl Fetcher for DaadFetcher {
    fn fetch_all(&self) -> Result<Vec<ProgrammeRecord>> {
        let raw = self.fetch_raw().map_err(|e| fetch_error("fetch_all", e))?;
        ProgrammeRecord::from_values(raw).map_err(|e| {
            ExError::new(ExErrorKind::Fetch)
                .with_op("fetch_all")
                .with_message("listing returned a record that cannot be tracked")
                .with_source(e)
        })
    }
}

/// Extract the `courses` array of one listing page
///
/// A body without `courses` counts as an empty page.
///
/// # Errors
///
/// `Decode` if the body is not JSON or `courses` is not an array of objects.
pub fn parse_page(body: &str) -> std::result::Result<Vec<Value>, ClientError> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::Decode(format!("listing page is not JSON: {}", e)))?;
    match data.get("courses") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(courses)) => {
            if let Some(bad) = courses.iter().position(|c| !c.is_object()) {
                return Err(ClientError::Decode(format!(
                    "courses[{}] is not an object",
                    bad
                )));
            }
            Ok(courses.clone())
        }
        Some(_) => Err(ClientError::Decode("`courses` is not an array".into())),
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> DaadFetcher {
        DaadFetcher::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_page_params_match_listing_query() {
        let params = fetcher().page_params(200);
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("limit"), Some("100"));
        assert_eq!(get("offset"), Some("200"));
        assert_eq!(get("sort"), Some("4"));
        assert_eq!(get("display"), Some("list"));
        assert_eq!(get("langEnAvailable"), Some(""));
        assert_eq!(params.len(), EMPTY_FILTERS.len() + 4);
    }

    #[test]
    fn test_parse_page_reads_courses() {
        let courses = parse_page(r#"{"courses": [{"id": 1}, {"id": 2}], "numResults": 2}"#).unwrap();
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn test_parse_page_without_courses_is_empty() {
        assert!(parse_page(r#"{"numResults": 0}"#).unwrap().is_empty());
        assert!(parse_page(r#"{"courses": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_rejects_html_and_bad_shapes() {
        assert!(matches!(parse_page("<html></html>"), Err(ClientError::Decode(_))));
        assert!(matches!(parse_page(r#"{"courses": {}}"#), Err(ClientError::Decode(_))));
        assert!(matches!(parse_page(r#"{"courses": [1]}"#), Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let config = FetchConfig {
            page_size: 0,
            ..FetchConfig::default()
        };
        assert!(matches!(DaadFetcher::new(config), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_retry_on_throttle_and_server_errors_only() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(!should_retry(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("äöü", 2), "äö…");
        assert_eq!(truncate("ab", 5), "ab");
    }
}
