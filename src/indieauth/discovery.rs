//! Authorization endpoint discovery.
//!
//! Workflow:
//! 1. GET the user's identity URL, following redirects
//! 2. Look for `rel="authorization_endpoint"` in the final response's `Link` headers
//! 3. Failing that, look for it in the page markup (honouring `<base href>`)
//! 4. Resolve whatever we found against the final URL

use crate::indieauth::fetch::Fetch;
use crate::indieauth::link_header;
use crate::indieauth::markup::LinkExtractor;
use crate::indieauth::uri;

pub const AUTHORIZATION_ENDPOINT_REL: &str = "authorization_endpoint";

/// Discover the authorization endpoint declared by `identity_url`.
///
/// Returns `None` on any failure: transport error, non-200 final status, or
/// no declaration in either the headers or the body.
pub async fn discover(
    fetch: &dyn Fetch,
    markup: &dyn LinkExtractor,
    identity_url: &str,
) -> Option<String> {
    let page = match fetch.get(identity_url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::info!(url = %identity_url, error = %e, "discovery fetch failed");
            return None;
        }
    };

    if page.status != 200 {
        tracing::info!(url = %page.url, status = page.status, "discovery got non-200 response");
        return None;
    }

    if let Some(href) = link_header::find_rel(&page.links, AUTHORIZATION_ENDPOINT_REL) {
        let endpoint = uri::resolve(&page.url, &href);
        tracing::debug!(url = %page.url, endpoint = %endpoint, "endpoint found in Link header");
        return Some(endpoint);
    }

    let found = markup.find_first_matching_link(&page.body, AUTHORIZATION_ENDPOINT_REL);
    let Some(href) = found.href else {
        tracing::info!(url = %page.url, "no authorization endpoint declared");
        return None;
    };

    let base = match found.base {
        Some(base) => uri::resolve(&page.url, &base),
        None => page.url,
    };
    let endpoint = uri::resolve(&base, &href);
    tracing::debug!(base = %base, endpoint = %endpoint, "endpoint found in markup");
    Some(endpoint)
}
