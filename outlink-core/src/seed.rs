// Seed URL validation

use outlink_scanner::ScanError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// `scheme://host[:port][/]` where host is a dotted DNS name ending in a
/// plausible TLD, `localhost`, or an IPv4 literal.
static SEED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+(?:[a-z]{2,6}\.?|[a-z0-9-]{2,})|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d{1,5})?/?$",
    )
    .expect("seed URL pattern compiles")
});

/// Checks a seed URL before any network activity happens.
pub fn validate_seed_url(seed: &str) -> Result<Url, ScanError> {
    let seed = seed.trim();
    if !SEED_PATTERN.is_match(seed) {
        return Err(ScanError::InvalidUrl(format!(
            "'{}' is not a site address, expected the form http://example.com",
            seed
        )));
    }

    Url::parse(seed).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))
}
