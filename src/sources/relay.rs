use serde::Deserialize;
use url::Url;

use crate::errors::TransportFailure;

/// JSON envelope returned by CORS relays such as allorigins.
#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    contents: Option<String>,
}

/// Builds `<relay>?url=<feed>`, keeping any query the relay already has.
pub fn relay_url(relay: &Url, feed_url: &str) -> Url {
    let mut url = relay.clone();
    url.query_pairs_mut().append_pair("url", feed_url);
    url
}

/// Returns the feed document inside a relay envelope, or the body unchanged
/// when it isn't one.
pub fn unwrap_relay_body(body: String) -> Result<String, TransportFailure> {
    if !body.trim_start().starts_with('{') {
        return Ok(body);
    }

    match serde_json::from_str::<RelayEnvelope>(&body) {
        Ok(RelayEnvelope {
            contents: Some(contents),
        }) if !contents.trim().is_empty() => Ok(contents),
        Ok(_) => Err(TransportFailure::EmptyRelay),
        Err(_) => Ok(body),
    }
}
