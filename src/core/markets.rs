use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::types::{Currency, Market};
use std::collections::HashMap;
use tracing::debug;

/// Per-connector reference data: vendor market id to [`Market`], plus the
/// unified symbol index and known currencies.
///
/// Populated by `load_markets` and only read afterwards; replacing it needs
/// `&mut`, so concurrent reloads are ruled out by the borrow checker.
#[derive(Debug, Clone, Default)]
pub struct MarketCache {
    by_id: HashMap<String, Market>,
    symbol_to_id: HashMap<String, String>,
    currencies: HashMap<String, Currency>,
    loaded: bool,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_markets(markets: Vec<Market>) -> Self {
        let mut cache = Self::new();
        cache.replace(markets);
        cache
    }

    /// Swap in a freshly fetched market list.
    pub fn replace(&mut self, markets: Vec<Market>) {
        self.by_id.clear();
        self.symbol_to_id.clear();
        for market in markets {
            self.symbol_to_id
                .insert(market.symbol.clone(), market.id.clone());
            self.by_id.insert(market.id.clone(), market);
        }
        self.loaded = true;
        debug!(markets = self.by_id.len(), "market cache replaced");
    }

    pub fn set_currencies(&mut self, currencies: HashMap<String, Currency>) {
        self.currencies = currencies;
    }

    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Market> {
        self.by_id.get(id)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Market> {
        self.symbol_to_id
            .get(symbol)
            .and_then(|id| self.by_id.get(id))
    }

    /// Market for a unified symbol, or `BadSymbol` naming the connector.
    pub fn market(&self, exchange: &str, symbol: &str) -> Result<&Market, ExchangeError> {
        if !self.loaded {
            return Err(ExchangeError::new(
                ErrorKind::BadSymbol,
                exchange,
                format!("markets not loaded, call load_markets() before using {}", symbol),
            ));
        }
        self.by_symbol(symbol).ok_or_else(|| {
            ExchangeError::new(
                ErrorKind::BadSymbol,
                exchange,
                format!("{} does not have market symbol {}", exchange, symbol),
            )
        })
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.by_id.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.symbol_to_id.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn currency(&self, code: &str) -> Option<&Currency> {
        self.currencies.get(code)
    }

    /// Unified code for a vendor currency id, when currencies are loaded.
    pub fn code_for_currency_id(&self, id: &str) -> Option<String> {
        self.currencies
            .values()
            .find(|currency| currency.id == id)
            .map(|currency| currency.code.clone())
    }

    /// Vendor id for a currency code, falling back to the code itself.
    pub fn currency_id(&self, code: &str) -> String {
        self.currencies
            .get(code)
            .map_or_else(|| code.to_string(), |currency| currency.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MarketLimits, MarketPrecision};
    use serde_json::Value;

    fn market(id: &str, base: &str, quote: &str) -> Market {
        Market {
            id: id.to_string(),
            symbol: format!("{}/{}", base, quote),
            base: base.to_string(),
            quote: quote.to_string(),
            base_id: base.to_string(),
            quote_id: quote.to_string(),
            active: Some(true),
            precision: MarketPrecision::default(),
            limits: MarketLimits::default(),
            info: Value::Null,
        }
    }

    #[test]
    fn test_lookup_round_trip() {
        let cache = MarketCache::from_markets(vec![market("X_Y", "X", "Y"), market("KRW-BTC", "BTC", "KRW")]);
        for m in cache.markets() {
            assert_eq!(cache.by_id(&m.id).unwrap().symbol, m.symbol);
            assert_eq!(cache.by_symbol(&m.symbol).unwrap().id, m.id);
        }
        assert_eq!(cache.symbols(), vec!["BTC/KRW".to_string(), "X/Y".to_string()]);
    }

    #[test]
    fn test_unloaded_cache_reports_bad_symbol() {
        let cache = MarketCache::new();
        let err = cache.market("upbit", "BTC/KRW").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadSymbol));
    }

    #[test]
    fn test_currency_id_falls_back_to_code() {
        let cache = MarketCache::new();
        assert_eq!(cache.currency_id("BTC"), "BTC");
    }
}
