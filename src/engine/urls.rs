use url::Url;

// * Builds the statement page URLs for one symbol, in the order they are tried.
// *
// * 1. Consolidated statements: {base}/company/{SYMBOL}/consolidated/
// * 2. Standalone statements:   {base}/company/{SYMBOL}/
// *
// * The symbol is a single path segment, so "/" or "?" inside it are escaped.
pub fn candidate_urls(base: &Url, symbol: &str) -> Vec<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Vec::new();
    }

    [true, false]
        .into_iter()
        .filter_map(|consolidated| statement_url(base, symbol, consolidated))
        .collect()
}

fn statement_url(base: &Url, symbol: &str, consolidated: bool) -> Option<String> {
    let mut url = base.clone();
    {
        // ? cannot-be-a-base URLs (mailto:, data:) have no path to extend
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty().push("company").push(symbol);
        if consolidated {
            segments.push("consolidated");
        }
        // * Trailing slash
        segments.push("");
    }
    Some(normalize_url(url))
}

// * Normalizes a URL to a deterministic representation.
// *
// * 1. Strip Fragment (#).
// * 2. Strip Query.
// * 3. Lowercase Hostname.
pub fn normalize_url(mut url: Url) -> String {
    url.set_fragment(None);
    url.set_query(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        // * Host is already valid, lowercasing cannot make it invalid
        let _ = url.set_host(Some(&lower_host));
    }

    url.to_string()
}
