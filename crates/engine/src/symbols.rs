use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineError;
use crate::traits::MarketData;

const BUILTIN_ALIASES: &[(&str, &str)] = &[("XAUUSDM", "XAUUSDm"), ("XAUUSD", "XAUUSDm")];

/// Maps a signal's symbol base to the broker's name for that instrument.
/// Keys are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolAliases {
    map: HashMap<String, String>,
}

impl SymbolAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::new().with_overrides(
            BUILTIN_ALIASES
                .iter()
                .map(|(base, broker)| (base.to_string(), broker.to_string())),
        )
    }

    pub fn with_overrides<I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (base, broker) in aliases {
            self.map.insert(base.to_uppercase(), broker);
        }
        self
    }

    pub fn get(&self, base: &str) -> Option<&str> {
        self.map.get(&base.to_uppercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Alias first, then the first broker symbol starting with `base`.
    pub async fn resolve<M>(&self, base: &str, market: &M) -> Result<String, EngineError>
    where
        M: MarketData + ?Sized,
    {
        if let Some(mapped) = self.get(base) {
            debug!("Symbol {} mapped to {} by alias", base, mapped);
            return Ok(mapped.to_string());
        }

        let base_up = base.to_uppercase();
        market
            .symbols()
            .await?
            .into_iter()
            .find(|name| name.to_uppercase().starts_with(&base_up))
            .ok_or_else(|| EngineError::SymbolNotFound(base.to_string()))
    }
}
