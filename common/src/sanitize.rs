// Ticker Canonicalization
// Tickers arrive from untrusted callers and end up in cache keys and
// rendered theses, so everything outside a small charset is stripped

use tracing::debug;

/// Longest ticker accepted after cleaning.
pub const MAX_TICKER_LEN: usize = 10;

/// Canonicalize an untrusted ticker string.
///
/// Keeps ASCII alphanumerics plus `.` and `-`, truncates to
/// `MAX_TICKER_LEN`, and uppercases so that cache lookups are
/// case-insensitive.
pub fn sanitize_ticker(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .take(MAX_TICKER_LEN)
        .collect::<String>()
        .to_uppercase();

    if cleaned != raw {
        debug!(raw, ticker = %cleaned, "sanitized ticker");
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_ticker_passes_through() {
        assert_eq!(sanitize_ticker("AAPL"), "AAPL");
        assert_eq!(sanitize_ticker("BRK.B"), "BRK.B");
        assert_eq!(sanitize_ticker("BF-B"), "BF-B");
    }

    #[test]
    fn test_lowercase_is_uppercased() {
        assert_eq!(sanitize_ticker("aapl"), "AAPL");
    }

    #[test]
    fn test_markup_is_stripped() {
        let cleaned = sanitize_ticker("<script>alert(1)</script>");
        assert!(cleaned.len() <= MAX_TICKER_LEN);
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains('>'));
        assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_overlong_ticker_is_truncated() {
        assert_eq!(sanitize_ticker("ABCDEFGHIJKLMNOP").len(), MAX_TICKER_LEN);
    }

    #[test]
    fn test_all_junk_becomes_empty() {
        assert_eq!(sanitize_ticker("$%&!"), "");
    }
}
