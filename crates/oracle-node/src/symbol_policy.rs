use oracle_common::config::FixedPrice;
use oracle_common::{Quote, SOURCE_FIXED};
use std::collections::HashMap;

/// Symbols answered with a hardcoded price instead of querying exchanges.
///
/// Checked before any source runs; a match skips all network I/O.
#[derive(Debug, Clone)]
pub struct SymbolPolicy {
    fixed: HashMap<String, f64>,
}

impl SymbolPolicy {
    pub fn new(entries: &[FixedPrice]) -> Self {
        let fixed = entries
            .iter()
            .flat_map(|entry| {
                entry
                    .aliases
                    .iter()
                    .map(|alias| alias.trim().to_uppercase())
                    .filter(|alias| !alias.is_empty())
                    .map(move |alias| (alias, entry.price))
            })
            .collect();

        Self { fixed }
    }

    /// Policy with no overrides
    pub fn empty() -> Self {
        Self {
            fixed: HashMap::new(),
        }
    }

    /// Fixed-price quote for a canonical symbol, if it is pinned
    pub fn resolve_fixed_price(&self, symbol: &str) -> Option<Quote> {
        let canonical = symbol.trim().to_uppercase();
        self.fixed
            .get(&canonical)
            .map(|&price| Quote::new(canonical, price, SOURCE_FIXED))
    }

    /// Pinned aliases, sorted
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.fixed.keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

impl Default for SymbolPolicy {
    /// The pegged `0G` token (alias `OG`) at 10
    fn default() -> Self {
        Self::new(&oracle_common::config::OracleConfig::default().fixed_prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pins_0g_aliases() {
        let policy = SymbolPolicy::default();

        for symbol in ["0G", "0g", "OG", "og", " og "] {
            let quote = policy.resolve_fixed_price(symbol).expect("pinned");
            assert_eq!(quote.price, 10.0);
            assert_eq!(quote.source, "fixed");
            assert_eq!(quote.symbol, symbol.trim().to_uppercase());
        }
    }

    #[test]
    fn test_unpinned_symbol_resolves_to_none() {
        let policy = SymbolPolicy::default();
        assert!(policy.resolve_fixed_price("BTC").is_none());
        assert!(policy.resolve_fixed_price("0GUSDT").is_none());
    }

    #[test]
    fn test_custom_entries() {
        let policy = SymbolPolicy::new(&[FixedPrice {
            aliases: vec!["peg".to_string(), "".to_string()],
            price: 1.0,
        }]);

        assert_eq!(policy.resolve_fixed_price("PEG").unwrap().price, 1.0);
        assert!(policy.resolve_fixed_price("").is_none());
        assert_eq!(policy.aliases(), vec!["PEG".to_string()]);
    }

    #[test]
    fn test_empty_policy() {
        assert!(SymbolPolicy::empty().resolve_fixed_price("0G").is_none());
    }
}
