//! Outbound HTTP for discovery and code exchange.
//! No retries: a timeout or transport failure is a negative answer.
use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK, LOCATION};
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::indieauth::uri;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("more than {0} redirects")]
    TooManyRedirects(usize),
}

/// Final response of a GET after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Effective URL after following redirects.
    pub url: String,
    pub status: u16,
    /// `Link` header values seen on responses for `url` only. Values from
    /// earlier hops are dropped whenever the effective URL changes.
    pub links: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub body: String,
}

/// Outbound HTTP capability used by discovery and code exchange.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// POST `form` url-encoded, asking for JSON back.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<FetchedBody, FetchError>;
}

pub struct HttpFetcher {
    /// Redirects are followed by hand so `Link` headers can be tracked per hop.
    discovery: reqwest::Client,
    exchange: reqwest::Client,
    total_timeout: Duration,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let connect_timeout = Duration::from_millis(cfg.connect_timeout_ms);
        let total_timeout = Duration::from_millis(cfg.http_timeout_ms);
        let user_agent = concat!("indietoken/", env!("CARGO_PKG_VERSION"));

        let discovery = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .redirect(Policy::none())
            .build()?;

        let exchange = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .redirect(Policy::limited(cfg.max_redirects))
            .build()?;

        Ok(Self {
            discovery,
            exchange,
            total_timeout,
            max_redirects: cfg.max_redirects,
        })
    }

    async fn follow(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut current = url.to_string();
        let mut effective = String::new();
        let mut links: Vec<String> = Vec::new();
        let mut hops = 0;

        loop {
            let resp = self.discovery.get(&current).send().await?;

            let url = resp.url().to_string();
            if url != effective {
                links.clear();
                effective = url;
            }
            links.extend(
                resp.headers()
                    .get_all(LINK)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string()),
            );

            let status = resp.status();
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match location {
                Some(location) if status.is_redirection() => {
                    if hops >= self.max_redirects {
                        return Err(FetchError::TooManyRedirects(self.max_redirects));
                    }
                    hops += 1;
                    current = uri::resolve(&effective, &location);
                    tracing::debug!(from = %effective, to = %current, hops, "following redirect");
                }
                _ => {
                    let body = resp.text().await?;
                    return Ok(FetchedPage {
                        url: effective,
                        status: status.as_u16(),
                        links,
                        body,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        // The client timeout is per hop; this bounds the whole chain.
        tokio::time::timeout(self.total_timeout, self.follow(url))
            .await
            .map_err(|_| FetchError::Timeout(self.total_timeout))?
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<FetchedBody, FetchError> {
        let resp = self
            .exchange
            .post(url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchedBody { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_keeps_only_final_hop_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", "/new")
                    .insert_header("Link", "<https://stale.example/auth>; rel=\"authorization_endpoint\""),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", "<https://fresh.example/auth>; rel=\"authorization_endpoint\"")
                    .set_body_string("hello"),
            )
            .mount(&server)
            .await;

        let page = fetcher().get(&format!("{}/old", server.uri())).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.url, format!("{}/new", server.uri()));
        assert_eq!(page.links, vec!["<https://fresh.example/auth>; rel=\"authorization_endpoint\""]);
        assert_eq!(page.body, "hello");
    }

    #[tokio::test]
    async fn test_get_stops_after_redirect_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&server)
            .await;

        let err = fetcher().get(&format!("{}/loop", server.uri())).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects(8)));
    }

    #[tokio::test]
    async fn test_get_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut cfg = Config::default();
        cfg.http_timeout_ms = 200;
        let err = HttpFetcher::new(&cfg).unwrap().get(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_) | FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_post_form_sends_fields_and_accept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_id=https%3A%2F%2Fapp.example%2F"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let resp = fetcher()
            .post_form(
                &format!("{}/auth", server.uri()),
                &[("code", "abc"), ("client_id", "https://app.example/")],
            )
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "{}");
    }
}
