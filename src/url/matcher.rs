use crate::url::domain::strip_www;
use url::Url;

/// Path segments that mark listing, taxonomy, or account pages rather than
/// articles. Matched as whole segments, case-insensitively.
const NON_DOCUMENT_SEGMENTS: &[&str] = &[
    "tag",
    "tags",
    "topic",
    "category",
    "categories",
    "kategori",
    "author",
    "authors",
    "penulis",
    "page",
    "search",
    "cari",
    "login",
    "logout",
    "signin",
    "signup",
    "register",
    "auth",
    "account",
];

/// Second-level labels that sit under a two-letter country code to form a
/// public suffix, as in `co.id` or `ac.uk`
const COUNTRY_SECOND_LEVELS: &[&str] = &[
    "ac", "co", "com", "edu", "go", "gov", "net", "or", "org", "sch", "web", "my", "biz",
];

/// Query keys that mark pagination or search pages
const NON_DOCUMENT_QUERY_KEYS: &[&str] = &["page", "q", "s", "search"];

/// Checks whether a candidate host belongs to a source's configured host
///
/// The comparison ignores a leading `www.` on either side and accepts
/// subdomains in both directions, so `www.example.com`, `example.com` and
/// `news.example.com` all match each other, while `example.org` or
/// `notexample.com` do not. The parent side of a subdomain match must be a
/// site rather than a public suffix, so neither `com` nor `co.id` matches
/// anything but itself.
///
/// Both hosts are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use shoal::url::host_matches;
///
/// assert!(host_matches("www.example.com", "example.com"));
/// assert!(host_matches("example.com", "markets.example.com"));
/// assert!(!host_matches("example.com", "myexample.com"));
/// ```
pub fn host_matches(configured: &str, candidate: &str) -> bool {
    let configured = strip_www(configured);
    let candidate = strip_www(candidate);

    if configured.is_empty() || candidate.is_empty() {
        return false;
    }

    if configured == candidate {
        return true;
    }

    let is_child_of = |child: &str, parent: &str| {
        is_site_host(parent) && child.ends_with(&format!(".{}", parent))
    };
    is_child_of(candidate, configured) || is_child_of(configured, candidate)
}

/// A host that names a site rather than a bare public suffix such as `com`
/// or `co.id`
fn is_site_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        [] | [_] => false,
        [second, tld] => !(tld.len() == 2 && COUNTRY_SECOND_LEVELS.contains(second)),
        _ => true,
    }
}

/// Checks whether a resolved URL points at a known non-article page
///
/// Rejects taxonomy (tag, category, author) pages, pagination, search and
/// authentication endpoints.
pub fn is_non_document_url(url: &Url) -> bool {
    let has_blocked_segment = url
        .path_segments()
        .map(|mut segments| {
            segments.any(|segment| {
                let segment = segment.to_lowercase();
                NON_DOCUMENT_SEGMENTS.contains(&segment.as_str())
            })
        })
        .unwrap_or(false);

    if has_blocked_segment {
        return true;
    }

    url.query_pairs()
        .any(|(key, _)| NON_DOCUMENT_QUERY_KEYS.contains(&key.to_lowercase().as_str()))
}

/// Checks whether a raw href can never point at a document: empty,
/// fragment-only, or a non-navigational scheme
pub fn is_non_navigational_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return true;
    }

    let lowered = href.to_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}
