//! `Link` header parsing (RFC 8288).
//!
//! A header value may carry several comma-separated link-values, and a
//! `rel` parameter may list several relation types, quoted or bare:
//!
//! ```text
//! Link: <https://a.example/auth>; rel="authorization_endpoint me", </t>; rel=token_endpoint
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// `<target>` followed by everything up to the next comma that is not
/// inside a quoted string.
static LINK_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<([^>]*)>((?:[^,"]|"(?:[^"\\]|\\.)*")*)"#).unwrap());

static LINK_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#";\s*([!#$%&'*+.^_`|~0-9A-Za-z-]+)\s*(?:=\s*(?:"((?:[^"\\]|\\.)*)"|([^;\s]*)))?"#)
        .unwrap()
});

/// A single parsed link-value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub rels: Vec<String>,
}

impl Link {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Parse one `Link` header value into its link-values, in order.
///
/// Malformed stretches between link-values are skipped rather than
/// rejecting the whole header.
pub fn parse(value: &str) -> Vec<Link> {
    LINK_VALUE
        .captures_iter(value)
        .map(|caps| {
            let target = caps[1].trim().to_string();
            let params = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let rels = LINK_PARAM
                .captures_iter(params)
                .find(|p| p[1].eq_ignore_ascii_case("rel"))
                .map(|p| {
                    let raw = p
                        .get(2)
                        .or_else(|| p.get(3))
                        .map(|m| m.as_str())
                        .unwrap_or_default();
                    raw.split_ascii_whitespace().map(str::to_string).collect()
                })
                .unwrap_or_default();
            Link { target, rels }
        })
        .collect()
}

/// First target carrying `rel` across a list of header values, preserving
/// header order.
pub fn find_rel<'a, I>(values: I, rel: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    values
        .into_iter()
        .flat_map(|v| parse(v))
        .find(|link| link.has_rel(rel))
        .map(|link| link.target)
}
