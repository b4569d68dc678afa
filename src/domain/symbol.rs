//! Splitting concatenated market symbols into base and quote.
//!
//! Some exchanges only publish `btcusd`-style symbols. The quote is found by
//! trying a list of known quote tickers as suffixes, in list order; the
//! first one that leaves a non-empty base wins. List order is the
//! tie-break, so callers put the quotes that must win first.
//!
//! This stays a heuristic: a base whose own ticker ends in a listed quote
//! (`xxxusd` traded against `eth`) resolves correctly only because the
//! whole symbol is matched as a suffix, never as a substring.

/// Split `symbol` into `(base, quote)`.
///
/// A `:` separator (`testbtc:testusd`) is taken literally and bypasses the
/// suffix search. Matching is case-insensitive; the returned parts keep the
/// caller's casing.
#[must_use]
pub fn split_concatenated<'a>(symbol: &'a str, quotes: &[&str]) -> Option<(&'a str, &'a str)> {
    if let Some((base, quote)) = symbol.split_once(':') {
        return (!base.is_empty() && !quote.is_empty()).then_some((base, quote));
    }

    let lower = symbol.to_ascii_lowercase();
    quotes.iter().find_map(|quote| {
        let quote = quote.to_ascii_lowercase();
        if lower.len() > quote.len() && lower.ends_with(&quote) {
            Some(symbol.split_at(symbol.len() - quote.len()))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTES: &[&str] = &["usd", "eur", "btc", "eth", "ust"];

    #[test]
    fn splits_on_known_suffix() {
        assert_eq!(split_concatenated("btcusd", QUOTES), Some(("btc", "usd")));
        assert_eq!(split_concatenated("ETHBTC", QUOTES), Some(("ETH", "BTC")));
    }

    #[test]
    fn list_order_breaks_ties() {
        // Both "eth" and "btc"-suffix forms are conceivable; only true
        // suffixes count, and the earlier list entry is tried first.
        assert_eq!(split_concatenated("btceth", QUOTES), Some(("btc", "eth")));
        assert_eq!(
            split_concatenated("btcust", &["st", "ust"]),
            Some(("btcu", "st"))
        );
    }

    #[test]
    fn quote_inside_base_is_not_a_match() {
        assert_eq!(split_concatenated("usdkbtc", QUOTES), Some(("usdk", "btc")));
        assert_eq!(split_concatenated("btcusdx", QUOTES), None);
    }

    #[test]
    fn bare_quote_has_no_base() {
        assert_eq!(split_concatenated("usd", QUOTES), None);
    }

    #[test]
    fn colon_separated_symbols_split_literally() {
        assert_eq!(
            split_concatenated("testbtc:testusd", QUOTES),
            Some(("testbtc", "testusd"))
        );
        assert_eq!(split_concatenated(":usd", QUOTES), None);
    }
}
