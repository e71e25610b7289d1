// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! HTTP fetching.

[UrlFetcher] abstracts the GET requests issued while checking repositories.
[HttpFetcher] implements it on top of [reqwest] (requires the `http`
feature). [MemoryFetcher] serves canned responses and records requests,
which is useful for testing.
*/

use {
    crate::error::Result,
    async_trait::async_trait,
    std::{collections::HashMap, sync::Mutex},
};

/// HTTP status code indicating a resource exists.
pub const STATUS_OK: u16 = 200;

/// Response to a GET request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text. Only populated for successful responses.
    pub body: Option<String>,
}

impl FetchResponse {
    /// Whether the server answered `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Performs GET requests against repository servers.
///
/// `Err` is reserved for transport failures. Any response the server actually
/// sends, including 404, is `Ok`.
#[async_trait]
pub trait UrlFetcher: Sync {
    /// GET a URL and read its body as text.
    async fn get_text(&self, url: &str) -> Result<FetchResponse>;

    /// GET a URL, only returning the status code.
    ///
    /// The default implementation delegates to [Self::get_text()].
    async fn get_status(&self, url: &str) -> Result<u16> {
        Ok(self.get_text(url).await?.status)
    }
}

#[cfg(feature = "http")]
mod client {
    use {
        super::{FetchResponse, UrlFetcher},
        crate::error::Result,
        async_trait::async_trait,
        log::trace,
        reqwest::Client,
        std::time::Duration,
    };

    /// User agent sent with every request.
    const USER_AGENT: &str = concat!("apt-urlcheck/", env!("CARGO_PKG_VERSION"));

    /// [UrlFetcher] backed by a [reqwest::Client].
    #[derive(Clone, Debug)]
    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        /// Construct an instance with an optional per-request timeout.
        pub fn new(timeout: Option<Duration>) -> Result<Self> {
            let mut builder = Client::builder().user_agent(USER_AGENT);

            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }

            Ok(Self::new_client(builder.build()?))
        }

        /// Construct an instance using the given [Client].
        pub fn new_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl UrlFetcher for HttpFetcher {
        async fn get_text(&self, url: &str) -> Result<FetchResponse> {
            let res = self.client.get(url).send().await?;
            let status = res.status().as_u16();
            trace!("GET {} -> {}", url, status);

            let body = if res.status().is_success() {
                Some(res.text().await?)
            } else {
                None
            };

            Ok(FetchResponse { status, body })
        }

        async fn get_status(&self, url: &str) -> Result<u16> {
            // The body is never read; dropping the response closes it.
            let status = self.client.get(url).send().await?.status().as_u16();
            trace!("GET {} -> {}", url, status);

            Ok(status)
        }
    }
}

#[cfg(feature = "http")]
pub use client::HttpFetcher;

/// [UrlFetcher] serving canned responses from memory.
///
/// URLs without a registered response answer `404`. Every request is
/// recorded, in order.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, FetchResponse>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    /// Register a `200 OK` response with the given body.
    pub fn with_ok(mut self, url: impl ToString, body: impl ToString) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status: STATUS_OK,
                body: Some(body.to_string()),
            },
        );
        self
    }

    /// Register a response with a status code and no body.
    pub fn with_status(mut self, url: impl ToString, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), FetchResponse { status, body: None });
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests issued for a URL.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl UrlFetcher for MemoryFetcher {
    async fn get_text(&self, url: &str) -> Result<FetchResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                body: None,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_fetcher() -> Result<()> {
        let fetcher = MemoryFetcher::default()
            .with_ok("http://a/dists", "<a href=\"x/\">")
            .with_status("http://a/forbidden", 403);

        let res = fetcher.get_text("http://a/dists").await?;
        assert!(res.is_ok());
        assert_eq!(res.body.as_deref(), Some("<a href=\"x/\">"));

        assert_eq!(fetcher.get_status("http://a/forbidden").await?, 403);
        assert_eq!(fetcher.get_status("http://a/missing").await?, 404);
        assert_eq!(fetcher.get_status("http://a/missing").await?, 404);

        assert_eq!(fetcher.requests().len(), 4);
        assert_eq!(fetcher.request_count("http://a/missing"), 2);

        Ok(())
    }
}
