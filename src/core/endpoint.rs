// Weblog Tail - core/endpoint.rs
//
// Derives the streaming socket URL from the page URL the log panel is
// served from: http -> ws, https -> wss, then the socket path segment.

use crate::util::constants::SOCKET_PATH_SEGMENT;
use crate::util::error::EndpointError;
use url::Url;

/// Compute the WebSocket endpoint for `page_url`.
///
/// `ws`/`wss` URLs are accepted as-is apart from the path handling, so an
/// operator can point at a socket host directly. Query string and fragment
/// are dropped. The socket segment is appended as a child of the page path:
/// `http://host/weblog/` and `http://host/weblog` both map to
/// `ws://host/weblog/socket`.
pub fn socket_endpoint(page_url: &str) -> Result<Url, EndpointError> {
    let input = page_url.trim();
    let mut url = Url::parse(input).map_err(|source| EndpointError::InvalidUrl {
        input: input.to_string(),
        source,
    })?;

    let ws_scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(EndpointError::UnsupportedScheme {
                input: input.to_string(),
                scheme: other.to_string(),
            })
        }
    };
    url.set_scheme(ws_scheme)
        .map_err(|()| EndpointError::SchemeRewrite {
            input: input.to_string(),
        })?;

    url.set_query(None);
    url.set_fragment(None);

    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(SOCKET_PATH_SEGMENT);
    url.set_path(&path);

    tracing::debug!(page = input, endpoint = %url, "Socket endpoint derived");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_maps_to_ws() {
        let url = socket_endpoint("http://logs.local:8080/weblog/").unwrap();
        assert_eq!(url.as_str(), "ws://logs.local:8080/weblog/socket");
    }

    #[test]
    fn test_https_maps_to_wss() {
        let url = socket_endpoint("https://example.com/").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/socket");
    }

    #[test]
    fn test_missing_trailing_slash_query_and_fragment() {
        let url = socket_endpoint("http://example.com/weblog?x=1#top").unwrap();
        assert_eq!(url.as_str(), "ws://example.com/weblog/socket");
    }

    #[test]
    fn test_bare_host() {
        let url = socket_endpoint("http://127.0.0.1:9000").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9000/socket");
    }

    #[test]
    fn test_ws_scheme_kept() {
        let url = socket_endpoint("wss://example.com/tail/").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/tail/socket");
    }

    #[test]
    fn test_unsupported_and_invalid() {
        assert!(matches!(
            socket_endpoint("ftp://example.com/"),
            Err(EndpointError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
        assert!(matches!(
            socket_endpoint("not a url"),
            Err(EndpointError::InvalidUrl { .. })
        ));
    }
}
