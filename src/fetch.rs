use crate::{Result, VitrineError};
use std::io::Read;
use std::time::Duration;
use url::Url;

/// Fetched response payload. `content_type` is kept for logging only;
/// format decisions are made from the bytes themselves.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Blocking HTTP client with a browser-like identity and a bounded
/// global timeout. No retries; a failed call is terminal for that
/// resource within the current run.
#[derive(Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let mut config = ureq::Agent::config_builder();
        config = config
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .user_agent(user_agent);
        let agent: ureq::Agent = config.build().into();
        Self { agent }
    }

    pub fn get(&self, url: &str) -> Result<FetchedBody> {
        let mut response = self.agent.get(url).call().map_err(|e| VitrineError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let code = response.status().as_u16();
        if !(200..300).contains(&code) {
            return Err(VitrineError::HttpStatus {
                url: url.to_string(),
                code,
            });
        }

        let content_type = header_string(&response, "content-type");
        let mut bytes = Vec::new();
        response
            .body_mut()
            .as_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| VitrineError::Network {
                url: url.to_string(),
                reason: format!("body read failed: {e}"),
            })?;

        Ok(FetchedBody { bytes, content_type })
    }

    /// Convenience for index/post pages: fetch and decode as text.
    pub fn get_text(&self, url: &str) -> Result<String> {
        let body = self.get(url)?;
        Ok(String::from_utf8_lossy(&body.bytes).into_owned())
    }
}

pub fn normalize_http_url(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VitrineError::InvalidUrl("empty URL provided".to_string()));
    }
    let parsed =
        Url::parse(trimmed).map_err(|_| VitrineError::InvalidUrl(trimmed.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(VitrineError::InvalidUrl(format!(
                "unsupported scheme for {trimmed}; only http/https are allowed"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(VitrineError::InvalidUrl(format!("URL is missing host: {trimmed}")));
    }
    Ok(trimmed.to_string())
}

fn header_string(response: &ureq::http::Response<ureq::Body>, key: &str) -> String {
    response
        .headers()
        .get(key)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase()
}
