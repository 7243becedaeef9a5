//! Finding `rel` links in an HTML document.
//!
//! Discovery only needs two answers from a page: the first element whose
//! `rel` list contains a given relation, and the first `<base href>`. Both
//! live behind [`LinkExtractor`] so the parser can be swapped out.

use scraper::{Html, Selector};

/// Links of interest pulled from one document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkupLinks {
    /// `href` of the first element, in document order, whose `rel` contains the relation.
    pub href: Option<String>,
    /// `href` of the first `<base>` element.
    pub base: Option<String>,
}

pub trait LinkExtractor: Send + Sync {
    fn find_first_matching_link(&self, document: &str, rel: &str) -> MarkupLinks;
}

/// HTML5 tree builder (html5ever via `scraper`). Recovers from broken
/// markup the same way browsers do instead of rejecting the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn find_first_matching_link(&self, document: &str, rel: &str) -> MarkupLinks {
        let (Ok(rel_selector), Ok(base_selector)) =
            (Selector::parse("[rel][href]"), Selector::parse("base[href]"))
        else {
            return MarkupLinks::default();
        };

        let html = Html::parse_document(document);

        let href = html
            .select(&rel_selector)
            .find(|el| {
                el.value()
                    .attr("rel")
                    .is_some_and(|rels| rels.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
            })
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string);

        // Only worth looking for a base when there is something to resolve.
        let base = match href {
            Some(_) => html
                .select(&base_selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(str::to_string),
            None => None,
        };

        MarkupLinks { href, base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REL: &str = "authorization_endpoint";

    fn extract(doc: &str) -> MarkupLinks {
        HtmlLinkExtractor.find_first_matching_link(doc, REL)
    }

    #[test]
    fn test_finds_link_in_head() {
        let doc = r#"<!doctype html><html><head>
            <link rel="authorization_endpoint" href="https://auth.example/auth">
            </head><body></body></html>"#;
        let found = extract(doc);
        assert_eq!(found.href.as_deref(), Some("https://auth.example/auth"));
        assert_eq!(found.base, None);
    }

    #[test]
    fn test_first_in_document_order_wins() {
        let doc = r#"<html><body>
            <a rel="me authorization_endpoint" href="/first">a</a>
            <link rel="authorization_endpoint" href="/second">
            </body></html>"#;
        assert_eq!(extract(doc).href.as_deref(), Some("/first"));
    }

    #[test]
    fn test_rel_token_must_be_whole_word() {
        let doc = r#"<link rel="authorization_endpoint_v2" href="/nope">
            <link rel="x-authorization_endpoint" href="/nope-either">
            <link rel="
              me   authorization_endpoint " href="/yes">"#;
        assert_eq!(extract(doc).href.as_deref(), Some("/yes"));
    }

    #[test]
    fn test_rel_match_ignores_ascii_case() {
        let doc = r#"<link rel="Authorization_Endpoint" href="/mixed">"#;
        assert_eq!(extract(doc).href.as_deref(), Some("/mixed"));
    }

    #[test]
    fn test_element_without_href_is_skipped() {
        let doc = r#"<link rel="authorization_endpoint"><a rel="authorization_endpoint" href="/a">x</a>"#;
        assert_eq!(extract(doc).href.as_deref(), Some("/a"));
    }

    #[test]
    fn test_base_href_is_reported() {
        let doc = r#"<html><head><base href="/sub/"><base href="/ignored/">
            <link rel="authorization_endpoint" href="auth"></head></html>"#;
        let found = extract(doc);
        assert_eq!(found.href.as_deref(), Some("auth"));
        assert_eq!(found.base.as_deref(), Some("/sub/"));
    }

    #[test]
    fn test_broken_markup_is_tolerated() {
        let doc = r#"<html><head><body><p><b><div>
            <link rel=authorization_endpoint href=https://auth.example/auth>
            <span></p></i></table>"#;
        assert_eq!(extract(doc).href.as_deref(), Some("https://auth.example/auth"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(extract("<html><body>hi</body></html>"), MarkupLinks::default());
        assert_eq!(extract(""), MarkupLinks::default());
    }
}
