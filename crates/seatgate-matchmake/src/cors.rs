//! CORS header helpers.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue};

/// Headers every matchmake response carries unless overridden.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("OPTIONS, POST, GET"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(
            "Origin, X-Requested-With, Content-Type, Accept, Authorization",
        ),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    // 30 days
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("2592000"));
    headers
}

/// Allows the requesting origin, or any origin when the request has none.
pub fn origin_headers(request: &HeaderMap) -> HeaderMap {
    let origin = request
        .get(ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers
}

/// Defaults overlaid with request-specific headers.
pub fn merge(defaults: HeaderMap, overrides: HeaderMap) -> HeaderMap {
    let mut headers = defaults;
    headers.extend(overrides);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_allow_matchmake_methods() {
        let headers = default_headers();

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS, POST, GET");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "2592000");
    }

    #[test]
    fn test_origin_headers_echoes_request_origin() {
        let mut request = HeaderMap::new();
        request.insert(ORIGIN, HeaderValue::from_static("https://game.example"));

        let headers = origin_headers(&request);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://game.example");
    }

    #[test]
    fn test_origin_headers_without_origin_allows_any() {
        let headers = origin_headers(&HeaderMap::new());

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_merge_overrides_replace_defaults() {
        let mut overrides = HeaderMap::new();
        overrides.insert(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://game.example"),
        );

        let headers = merge(default_headers(), overrides);

        assert_eq!(
            headers.get_all(ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(),
            1
        );
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://game.example");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS, POST, GET");
    }
}
