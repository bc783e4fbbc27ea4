use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::errors::{NewsError, NewsResult, TransportFailure};
use crate::sources::relay::{relay_url, unwrap_relay_body};
use crate::sources::traits::Transport;

pub const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible) newswire/", env!("CARGO_PKG_VERSION"));

static XML_ENCODING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*<\?xml[^>]*\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap());

/// Fetches feeds over HTTP(S), optionally through a CORS relay.
pub struct HttpTransport {
    client: Client,
    relay: Option<Url>,
}

impl HttpTransport {
    /// `timeout` bounds connecting and, separately, each read of the response.
    pub fn new(timeout: Duration) -> NewsResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .redirect(Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NewsError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            relay: None,
        })
    }

    pub fn with_relay(mut self, relay: Option<Url>) -> Self {
        self.relay = relay;
        self
    }

    fn request_url(&self, url: &str) -> String {
        match &self.relay {
            Some(relay) => relay_url(relay, url).into(),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> NewsResult<String> {
        let request_url = self.request_url(url);

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| NewsError::transport(url, classify(&e)))?;

        let status = response.status();
        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        // Read the body regardless of status; it helps when diagnosing failures
        let bytes = response
            .bytes()
            .await
            .map_err(|e| {
                let kind = match classify(&e) {
                    TransportFailure::Timeout => TransportFailure::Timeout,
                    _ => TransportFailure::Body(e.to_string()),
                };
                NewsError::transport(url, kind)
            })?;
        let body = decode_body(&bytes, charset.as_deref());

        if !status.is_success() {
            tracing::debug!(
                feed = %url,
                status = status.as_u16(),
                body = %body.chars().take(200).collect::<String>(),
                "Feed responded with error status"
            );
            return Err(NewsError::transport(url, TransportFailure::Status(status.as_u16())));
        }

        unwrap_relay_body(body).map_err(|kind| NewsError::transport(url, kind))
    }
}

fn classify(error: &reqwest::Error) -> TransportFailure {
    if error.is_timeout() || has_timed_out_io(error) {
        TransportFailure::Timeout
    } else {
        TransportFailure::Connect(error.to_string())
    }
}

/// Read timeouts surface as an `io::ErrorKind::TimedOut` somewhere in the chain.
fn has_timed_out_io(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if err
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        source = err.source();
    }
    false
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn declared_xml_encoding(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    XML_ENCODING
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decodes a feed body: BOM first, then the HTTP charset, then the XML
/// declaration, then UTF-8 with replacement characters.
fn decode_body(bytes: &[u8], header_charset: Option<&str>) -> String {
    let encoding = header_charset
        .map(str::to_string)
        .or_else(|| declared_xml_encoding(bytes))
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Feed body contained undecodable bytes");
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = "<rss><channel><item><title>T</title><link>http://a</link></item></channel></rss>";

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/xml; charset=\"windows-1255\"").as_deref(),
            Some("windows-1255")
        );
        assert_eq!(
            charset_from_content_type("application/rss+xml;Charset=UTF-8").as_deref(),
            Some("UTF-8")
        );
        assert!(charset_from_content_type("text/xml").is_none());
    }

    #[test]
    fn test_decode_body_uses_xml_declaration() {
        // "שלום" in windows-1255
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"windows-1255\"?><t>".to_vec();
        bytes.extend_from_slice(&[0xF9, 0xEC, 0xE5, 0xED]);
        bytes.extend_from_slice(b"</t>");

        let text = decode_body(&bytes, None);
        assert!(text.contains("שלום"));
    }

    #[test]
    fn test_decode_body_header_wins_over_declaration() {
        let bytes = "<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><t>שלום</t>".as_bytes();
        let text = decode_body(bytes, Some("utf-8"));
        assert!(text.contains("שלום"));
    }

    #[test]
    fn test_decode_body_unknown_label_falls_back_to_utf8() {
        let text = decode_body("<t>ok</t>".as_bytes(), Some("x-made-up"));
        assert_eq!(text, "<t>ok</t>");
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(1)
            .mount(&server)
            .await;

        let body = transport()
            .fetch_text(&format!("{}/feed", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, RSS);
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        match transport().fetch_text(&url).await {
            Err(NewsError::Transport { url: failed, kind }) => {
                assert_eq!(failed, url);
                assert_eq!(kind, TransportFailure::Status(404));
            }
            other => panic!("Expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let body = transport()
            .fetch_text(&format!("{}/old", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, RSS);
    }

    #[tokio::test]
    async fn test_fetch_through_relay_unwraps_envelope() {
        let server = MockServer::start().await;
        let envelope = serde_json::json!({ "contents": RSS });
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("url", "https://news.example/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope))
            .expect(1)
            .mount(&server)
            .await;

        let relay = Url::parse(&format!("{}/get", server.uri())).unwrap();
        let body = transport()
            .with_relay(Some(relay))
            .fetch_text("https://news.example/rss")
            .await
            .unwrap();
        assert_eq!(body, RSS);
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "wrapped")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_timed_out_io_found_in_error_chain() {
        let timed_out = Wrapped(std::io::Error::new(std::io::ErrorKind::TimedOut, "read"));
        let reset = Wrapped(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));

        assert!(has_timed_out_io(&timed_out));
        assert!(!has_timed_out_io(&reset));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RSS)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();
        match transport.fetch_text(&server.uri()).await {
            Err(NewsError::Transport { kind, .. }) => assert_eq!(kind, TransportFailure::Timeout),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on port 9 locally
        let result = transport().fetch_text("http://127.0.0.1:9/feed").await;
        assert!(matches!(result, Err(NewsError::Transport { .. })));
    }
}
