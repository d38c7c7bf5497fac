//! URL heuristics for the Shein CDN namespace.
//!
//! Shared by the candidate builder and the image signal fusion: host
//! recognition, scheme normalization, size-token upgrades, and the
//! thumbnail/asset exclusion rules. All functions are pure.

use url::Url;

/// Size tokens the CDN uses for downscaled renditions.
const UPGRADABLE_TOKENS: [&str; 3] = ["_200x", "_300x", "_400x"];

/// Tokens that mark an image as a tiny thumbnail not worth fetching.
const THUMBNAIL_TOKENS: [&str; 5] = ["_thumb", "_thumbnail", "_60x", "_80x", "_100x"];

/// Path fragments that mark obvious non-product assets.
const ASSET_TOKENS: [&str; 4] = ["sprite", "icon", "logo", "placeholder"];

/// Returns true if the URL points at a recognized Shein CDN host.
pub fn is_cdn_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("ltwebstatic") || lower.contains("shein")
}

/// Returns true for hostnames in the Shein CDN namespace.
///
/// Query strings on these hosts may carry sizing or signing parameters and
/// must be preserved; all other hosts get their query stripped.
pub fn is_cdn_host(host: &str) -> bool {
    let lower = host.to_lowercase();
    ["ltwebstatic", "shein", "sheinsz", "sheincdn"].iter().any(|t| lower.contains(t))
}

/// Normalizes scheme-relative URLs (`//host/...`) to https.
pub fn normalize_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    }
}

/// Returns true for sprite/icon/logo style assets that are never product shots.
pub fn looks_like_asset(url: &str) -> bool {
    let lower = url.to_lowercase();
    ASSET_TOKENS.iter().any(|t| lower.contains(t))
}

/// Returns true for explicit small-size tokens or `WxH` dimension suffixes
/// under the thumbnail threshold (two-digit dimensions like `_50x50.`).
pub fn is_tiny_thumbnail(url: &str) -> bool {
    let lower = url.to_lowercase();
    if THUMBNAIL_TOKENS.iter().any(|t| lower.contains(t)) {
        return true;
    }
    has_small_dimension_suffix(&lower)
}

/// Matches `_WWxHH.` / `-WWxHH.` suffixes where both dimensions are two digits.
fn has_small_dimension_suffix(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    for (i, window) in bytes.windows(7).enumerate() {
        if (window[0] == b'_' || window[0] == b'-')
            && window[1].is_ascii_digit()
            && window[2].is_ascii_digit()
            && window[3] == b'x'
            && window[4].is_ascii_digit()
            && window[5].is_ascii_digit()
            && window[6] == b'.'
        {
            // Reject if either dimension actually has more digits.
            let more = bytes.get(i + 7).is_some_and(|b| b.is_ascii_digit());
            if !more {
                return true;
            }
        }
    }
    false
}

/// Rewrites a path (or bare URL string) to the requested size rendition.
///
/// Known downscale tokens are replaced; paths already at `_750x`/`_1000x`
/// are left alone so repeated upgrades stay idempotent; otherwise the size
/// token is inserted before the file extension when one exists.
pub fn upgrade_size(path: &str, size: &str) -> String {
    for token in UPGRADABLE_TOKENS {
        if path.contains(token) {
            return path.replacen(token, &format!("_{}", size), 1);
        }
    }

    if path.contains("_750x.") || path.contains("_1000x.") {
        return path.to_string();
    }

    match path.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, size, ext),
        None => path.to_string(),
    }
}

/// Size-upgrades a full URL, keeping its query string intact.
pub fn upgrade_image_url(url: &str, size: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let origin = parsed.origin().ascii_serialization();
            let path = upgrade_size(parsed.path(), size);
            match parsed.query() {
                Some(query) => format!("{}{}?{}", origin, path, query),
                None => format!("{}{}", origin, path),
            }
        }
        Err(_) => upgrade_size(url, size),
    }
}
