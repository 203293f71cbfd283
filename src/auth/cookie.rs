//! Cookie parsing and `Set-Cookie` construction for the session tokens.
//!
//! Both cookies are `HttpOnly; Secure; SameSite=None` so the API can be
//! called cross-origin from a browser, but only over a secure transport.

use axum::http::{HeaderMap, HeaderValue, header};

use super::types::IssuedTokens;

/// Cookie name for the access token (short-lived).
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const COOKIE_ATTRIBUTES: &str = "HttpOnly; Secure; SameSite=None; Path=/";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Build a `Set-Cookie` value that stores `value` for `max_age` seconds.
pub fn session_cookie(name: &str, value: &str, max_age: u64) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        name, value, COOKIE_ATTRIBUTES, max_age
    )
}

/// Build a `Set-Cookie` value that removes the cookie.
pub fn cleared_cookie(name: &str) -> String {
    format!("{}=; {}; Max-Age=0", name, COOKIE_ATTRIBUTES)
}

/// Append both session cookies for a freshly issued token pair.
pub fn append_session_cookies(headers: &mut HeaderMap, tokens: &IssuedTokens) {
    append_cookie(
        headers,
        session_cookie(
            ACCESS_COOKIE_NAME,
            &tokens.access_token,
            tokens.access_max_age,
        ),
    );
    append_cookie(
        headers,
        session_cookie(
            REFRESH_COOKIE_NAME,
            &tokens.refresh_token,
            tokens.refresh_max_age,
        ),
    );
}

/// Append `Set-Cookie` headers that clear both session cookies.
pub fn append_cleared_cookies(headers: &mut HeaderMap) {
    append_cookie(headers, cleared_cookie(ACCESS_COOKIE_NAME));
    append_cookie(headers, cleared_cookie(REFRESH_COOKIE_NAME));
}

/// Whether the response already sets or clears either session cookie.
pub fn sets_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split_once('='))
        .any(|(name, _)| {
            let name = name.trim();
            name == ACCESS_COOKIE_NAME || name == REFRESH_COOKIE_NAME
        })
}

fn append_cookie(headers: &mut HeaderMap, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Refusing to emit invalid Set-Cookie header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=abc123"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; access_token=abc123; refresh_token=xyz789"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
        assert_eq!(get_cookie(&headers, "refresh_token"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "access_token"), None);
    }

    #[test]
    fn test_get_cookie_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(get_cookie(&headers, "access_token"), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  access_token = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, "access_token"), Some("abc123"));
    }

    #[test]
    fn test_sets_session_cookie() {
        let mut headers = HeaderMap::new();
        assert!(!sets_session_cookie(&headers));

        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("theme=dark; Path=/"),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("my_access_token=x; Path=/"),
        );
        assert!(!sets_session_cookie(&headers));

        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_str(&cleared_cookie(REFRESH_COOKIE_NAME)).unwrap(),
        );
        assert!(sets_session_cookie(&headers));
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie(ACCESS_COOKIE_NAME, "tok", 900);

        assert!(cookie.starts_with("access_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_cleared_cookie() {
        let cookie = cleared_cookie(REFRESH_COOKIE_NAME);

        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_append_session_cookies() {
        let tokens = IssuedTokens {
            access_token: "aaa".to_string(),
            access_max_age: 60,
            refresh_token: "rrr".to_string(),
            refresh_max_age: 86400,
        };
        let mut headers = HeaderMap::new();
        append_session_cookies(&mut headers, &tokens);

        let cookies: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("access_token=aaa;"));
        assert!(cookies[0].contains("Max-Age=60"));
        assert!(cookies[1].starts_with("refresh_token=rrr;"));
        assert!(cookies[1].contains("Max-Age=86400"));
    }

    #[test]
    fn test_append_cleared_cookies() {
        let mut headers = HeaderMap::new();
        append_cleared_cookies(&mut headers);

        let cookies: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
