use std::time::Duration;

/// Error surfaced by a favicon fetch attempt. One candidate failing is
/// expected; the resolver simply moves to the next source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "favicon fetch failed: {}", self.message)
    }
}

impl std::error::Error for FetchError {}

/// Fetches raw icon bytes for a candidate URL. Implementations decide
/// transport; callers decide whether the bytes decode.
pub trait FaviconFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher with a bounded per-request timeout.
pub struct HttpFaviconFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFaviconFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| FetchError::new(format!("client setup: {error}")))?;
        Ok(Self { client })
    }
}

impl FaviconFetcher for HttpFaviconFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| FetchError::new(format!("request to {url}: {error}")))?;
        if !response.status().is_success() {
            return Err(FetchError::new(format!(
                "{url} returned status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|error| FetchError::new(format!("body of {url}: {error}")))?;
        Ok(bytes.to_vec())
    }
}

/// Candidate favicon sources for a host, tried in order. Third-party
/// resolvers first since they normalize formats and sizes; the site's own
/// `/favicon.ico` is the last resort.
pub fn candidate_urls(host: &str) -> [String; 3] {
    [
        format!("https://www.google.com/s2/favicons?domain={host}&sz=64"),
        format!("https://icons.duckduckgo.com/ip3/{host}.ico"),
        format!("https://{host}/favicon.ico"),
    ]
}

#[cfg(test)]
mod tests {
    use super::{candidate_urls, FetchError};

    #[test]
    fn candidates_cover_three_sources_in_order() {
        let urls = candidate_urls("example.com");
        assert!(urls[0].contains("google.com/s2/favicons"));
        assert!(urls[0].contains("domain=example.com"));
        assert!(urls[1].contains("duckduckgo.com/ip3/example.com.ico"));
        assert_eq!(urls[2], "https://example.com/favicon.ico");
    }

    #[test]
    fn fetch_error_formats_with_context() {
        let error = FetchError::new("timed out");
        assert_eq!(error.to_string(), "favicon fetch failed: timed out");
    }
}
