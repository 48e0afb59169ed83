use url::Url;

/// List of tracking query parameters to remove during canonicalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
    "amp",
];

/// Canonicalizes a URL for duplicate checks
///
/// # Canonicalization Steps
///
/// 1. Lowercase the whole URL
/// 2. Remove the fragment
/// 3. Remove tracking query parameters, sort the rest alphabetically
/// 4. Remove trailing slashes
///
/// Input that does not parse as a URL is lowercased and stripped of trailing
/// slashes only, so the function is total.
///
/// # Examples
///
/// ```
/// use shoal::url::canonicalize_url;
///
/// let url = canonicalize_url("https://News.Example.com/Read/1/?utm_source=x");
/// assert_eq!(url, "https://news.example.com/read/1");
/// ```
pub fn canonicalize_url(url_str: &str) -> String {
    let lowered = url_str.trim().to_lowercase();

    let mut url = match Url::parse(&lowered) {
        Ok(url) => url,
        Err(_) => return lowered.trim_end_matches('/').to_string(),
    };

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    let trimmed_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed_path);

    let result = url.to_string();
    if url.query().is_none() {
        result.trim_end_matches('/').to_string()
    } else {
        result
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
