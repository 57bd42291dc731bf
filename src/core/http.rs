use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = "InterfaceOficial/0.1.0";

/// Shared client. Compression is disabled so byte offsets used for
/// `Range` resumption match what lands on disk.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .build()
}

/// GET a document as text, failing on any non-2xx status.
pub async fn get_text(client: &Client, url: &str) -> LauncherResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> LauncherResult<T> {
    let raw = get_text(client, url).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Try each URL in order and return the first successful body.
pub async fn get_text_from_any(client: &Client, urls: &[String]) -> LauncherResult<String> {
    let mut last_error = None;
    for url in urls {
        match get_text(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| LauncherError::Other("no URL to fetch".into())))
}

/// HTTP status carried by an error, if the server answered at all.
pub fn error_status(error: &LauncherError) -> Option<u16> {
    match error {
        LauncherError::DownloadFailed { status, .. } => Some(*status),
        LauncherError::Http(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    }
}
