//! Shape checks for values crossing the trust boundary: inbound form fields,
//! bearer headers, and the identity assertion returned by an authorization
//! endpoint.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::indieauth::uri::Uri;

/// Schemes that may be absolute without naming a host.
const HOSTLESS_SCHEMES: [&str; 3] = ["mailto", "news", "file"];

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\x20-\x7E]+$").unwrap());

static SCOPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\x21\x23-\x5B\x5D-\x7E]+( [\x21\x23-\x5B\x5D-\x7E]+)*$").unwrap()
});

static BEARER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Bearer ([0-9a-z]+)$").unwrap());

/// An absolute URL we are willing to store or fetch.
///
/// The `url` crate silently strips surrounding whitespace and embedded tabs
/// or newlines, so those are rejected up front. It also repairs `http:/host`
/// into `http://host`, so the authority is checked on the raw string.
pub fn is_valid_url(value: &str) -> bool {
    if value.is_empty()
        || !value.is_ascii()
        || value.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return false;
    }
    let Ok(url) = url::Url::parse(value) else {
        return false;
    };
    if HOSTLESS_SCHEMES.contains(&url.scheme()) {
        return true;
    }
    Uri::parse(value).authority.is_some() && url.host_str().is_some_and(|h| !h.is_empty())
}

/// Authorization codes are opaque, but must be printable ASCII.
pub fn is_valid_code(value: &str) -> bool {
    CODE_RE.is_match(value)
}

/// One or more scope tokens separated by single spaces. Tokens exclude
/// whitespace, `"` and `\`.
pub fn is_valid_scope(value: &str) -> bool {
    SCOPE_RE.is_match(value)
}

/// Outcome of reading an `Authorization` header for introspection.
#[derive(Debug, PartialEq, Eq)]
pub enum BearerHeader<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

pub fn parse_bearer(header: Option<&str>) -> BearerHeader<'_> {
    let Some(header) = header else {
        return BearerHeader::Missing;
    };
    match BEARER_RE.captures(header).and_then(|c| c.get(1)) {
        Some(token) => BearerHeader::Token(token.as_str()),
        None => BearerHeader::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://user.example/"));
        assert!(is_valid_url("http://localhost:8080/callback?x=1"));
        assert!(is_valid_url("https://app.example"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("user.example"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url(" https://user.example/"));
        assert!(!is_valid_url("https://user.example/\tx"));
        assert!(!is_valid_url("https://üser.example/"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn test_urls_without_authority_are_invalid() {
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("data:text/html,hi"));
        assert!(!is_valid_url("urn:isbn:123"));
        assert!(!is_valid_url("http:/user.example/"));
        assert!(!is_valid_url("https:user.example"));
    }

    #[test]
    fn test_hostless_schemes_are_allowed() {
        assert!(is_valid_url("mailto:user@example.com"));
        assert!(is_valid_url("file:///etc/hosts"));
        assert!(is_valid_url("ftp://files.example/pub"));
    }

    #[test]
    fn test_code_grammar() {
        assert!(is_valid_code("abc 123 ~!"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("line\nbreak"));
        assert!(!is_valid_code("caf\u{e9}"));
    }

    #[test]
    fn test_scope_grammar() {
        assert!(is_valid_scope("create"));
        assert!(is_valid_scope("create update media:write"));
        assert!(!is_valid_scope(""));
        assert!(!is_valid_scope("create  update"));
        assert!(!is_valid_scope(" create"));
        assert!(!is_valid_scope("create "));
        assert!(!is_valid_scope("say\"hi\""));
        assert!(!is_valid_scope("back\\slash"));
        assert!(!is_valid_scope("cr\u{e9}ate"));
        assert!(!is_valid_scope("create\tupdate"));
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(None), BearerHeader::Missing);
        assert_eq!(parse_bearer(Some("Bearer abc123")), BearerHeader::Token("abc123"));
        assert_eq!(parse_bearer(Some("Bearer ABC")), BearerHeader::Malformed);
        assert_eq!(parse_bearer(Some("bearer abc")), BearerHeader::Malformed);
        assert_eq!(parse_bearer(Some("Bearer ")), BearerHeader::Malformed);
        assert_eq!(parse_bearer(Some("Basic dXNlcg==")), BearerHeader::Malformed);
    }
}
