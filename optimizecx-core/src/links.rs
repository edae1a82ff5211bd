//! Internal link normalization for the preload reconciler.
//!
//! ## Rules
//! - Empty references, non-navigable schemes (`mailto:`, `tel:`, `sms:`,
//!   `javascript:`, `data:`, case-insensitive) and fragment-only
//!   references (`#reviews`) are rejected.
//! - `http(s)://…` is parsed as-is; `//host/…` borrows the page scheme;
//!   `/path` is appended to the page origin; anything else is treated as
//!   `origin + "/" + reference`.
//! - A reference resolving to a different origin is rejected.
//! - A reference that fails to parse is dropped on its own; the rest of
//!   the scan continues.

use std::collections::BTreeSet;

use url::Url;

const NON_NAVIGABLE_SCHEMES: [&str; 5] = ["mailto:", "tel:", "sms:", "javascript:", "data:"];

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Normalize one anchor `href` to an absolute same-origin URL.
pub fn normalize_internal_href(href: &str, page_origin: &Url) -> Option<Url> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if NON_NAVIGABLE_SCHEMES
        .iter()
        .any(|scheme| has_prefix_ignore_case(href, scheme))
    {
        return None;
    }

    let origin = page_origin.origin().ascii_serialization();
    let candidate = if has_prefix_ignore_case(href, "http://") || has_prefix_ignore_case(href, "https://") {
        Url::parse(href)
    } else if href.starts_with("//") {
        Url::parse(&format!("{}:{href}", page_origin.scheme()))
    } else if href.starts_with('/') {
        Url::parse(&format!("{origin}{href}"))
    } else {
        Url::parse(&format!("{origin}/{href}"))
    };

    match candidate {
        Ok(url) if url.origin() == page_origin.origin() => Some(url),
        Ok(url) => {
            tracing::trace!(%url, "dropping cross-origin link");
            None
        }
        Err(e) => {
            tracing::debug!(href, error = %e, "dropping unparseable link");
            None
        }
    }
}

/// Normalize and deduplicate every href into a set of absolute URLs.
pub fn collect_internal_urls<'a, I>(hrefs: I, page_origin: &Url) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| normalize_internal_href(href, page_origin))
        .map(String::from)
        .collect()
}

/// Path plus query of `url`, origin and fragment stripped.
///
/// An empty query (`/cart?`) is dropped, matching how browsers report
/// `location.search`.
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{query}", url.path()),
        _ => url.path().to_string(),
    }
}
