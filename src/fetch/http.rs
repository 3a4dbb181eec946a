// src/fetch/http.rs
// =============================================================================
// Fetches pages over HTTP with reqwest.
//
// Key functionality:
// - GET request with a per-request timeout
// - Redirects followed (up to a limit) or not, per FetchOptions
// - Non-2xx responses are failures
// - reqwest errors are sorted into FetchError variants (timeout, DNS, TLS...)
//
// Rust concepts:
// - async_trait: lets us put an async fn behind a trait object (Arc<dyn Fetcher>)
// - Client is cheap to clone and pools connections internally
// =============================================================================

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use tracing::debug;
use url::Url;

use super::{FetchError, FetchOptions, Fetcher};

const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = concat!("depth-crawler/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed fetcher.
///
/// The redirect policy is a client-level setting in reqwest, so we keep one
/// client per policy and pick per request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    following: Client,
    direct: Client,
}

impl HttpFetcher {
    pub fn new() -> reqwest::Result<Self> {
        let following = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        let direct = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { following, direct })
    }

    fn client(&self, options: &FetchOptions) -> &Client {
        if options.follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client(options)
            .get(url.clone())
            .timeout(options.timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(categorize_error)?;
        debug!(%url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

// Sorts reqwest errors into our failure categories
fn categorize_error(error: reqwest::Error) -> FetchError {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        if error_string.contains("dns") {
            FetchError::Dns
        } else {
            FetchError::Connect(error.to_string())
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        FetchError::Tls
    } else {
        FetchError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url_for(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher
            .fetch(&url_for(&server, "/page"), &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(body, b"<a href=\"/x\">x</a>");
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&url_for(&server, "/missing"), &FetchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let options = FetchOptions {
            timeout: Duration::from_millis(100),
            ..FetchOptions::default()
        };
        let err = fetcher
            .fetch(&url_for(&server, "/slow"), &options)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_redirect_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let followed = fetcher
            .fetch(&url_for(&server, "/old"), &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(followed, b"moved");

        let options = FetchOptions {
            follow_redirects: false,
            ..FetchOptions::default()
        };
        let err = fetcher
            .fetch(&url_for(&server, "/old"), &options)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(302));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Grab a free port, then close the listener so nothing answers on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&url, &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect(_)), "got {err:?}");
    }
}
