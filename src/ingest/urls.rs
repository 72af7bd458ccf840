//! Publisher allowlist and URL helpers shared by all fetchers.

use url::Url;

/// Domain of the primary news API; its bare root is never a valid article link.
pub const PRIMARY_DOMAIN: &str = "cryptopanic.com";

/// Known publishers, with the display name used when a feed carries none.
const PUBLISHERS: &[(&str, &str)] = &[
    ("cryptopanic.com", "CryptoPanic"),
    ("cointelegraph.com", "CoinTelegraph"),
    ("decrypt.co", "Decrypt"),
    ("theblock.co", "The Block"),
    ("cryptoslate.com", "CryptoSlate"),
    ("newsbtc.com", "NewsBTC"),
    ("coindesk.com", "CoinDesk"),
    ("ambcrypto.com", "AMBCrypto"),
    ("u.today", "U.Today"),
    ("binance.com", "Binance"),
];

const UNKNOWN_SOURCE: &str = "Crypto News";

fn host_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn is_bare_primary_root(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let is_primary = host == PRIMARY_DOMAIN || host == format!("www.{PRIMARY_DOMAIN}");
    is_primary && matches!(parsed.path(), "" | "/") && parsed.query().is_none()
}

/// Valid iff non-empty, not the bare root of the primary source, and hosted on
/// an allowlisted publisher domain (or one of its subdomains).
pub fn is_valid_url(raw: &str) -> bool {
    if raw.trim().is_empty() || is_bare_primary_root(raw) {
        return false;
    }
    match host_of(raw) {
        Some(host) => PUBLISHERS.iter().any(|(d, _)| host_matches(&host, d)),
        None => false,
    }
}

/// Publisher display name for a URL ("Crypto News" when unknown).
pub fn source_name_from_url(raw: &str) -> String {
    host_of(raw)
        .and_then(|host| {
            PUBLISHERS
                .iter()
                .find(|(d, _)| host_matches(&host, d))
                .map(|(_, name)| name.to_string())
        })
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}
