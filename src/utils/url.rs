//! Joining configured base URLs with route and endpoint paths.

/// Base URL without trailing slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Append `endpoint` to `base_url` with exactly one slash between them.
///
/// ```
/// use relaychat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:5000/", "chat/stream"),
///     "http://localhost:5000/chat/stream"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}
