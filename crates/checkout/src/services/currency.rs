//! Currency conversion trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Money, NANOS_PER_UNIT};
use parking_lot::RwLock;

use crate::error::ServiceError;

/// Trait for converting money between currencies.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    /// Returns the supported currency codes, sorted.
    async fn supported_currencies(&self) -> Result<Vec<String>, ServiceError>;

    /// Converts `from` into `to_code`.
    async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCurrencyState {
    /// Billionths of the currency worth one USD.
    rates: HashMap<String, i64>,
    fail_on_convert: bool,
    conversions: usize,
}

/// In-memory currency service with a fixed rate table.
///
/// Conversion goes through USD and truncates toward zero, so results are
/// deterministic for a given table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCurrencyService {
    state: Arc<RwLock<InMemoryCurrencyState>>,
}

impl InMemoryCurrencyService {
    /// Creates a service that only knows USD.
    pub fn new() -> Self {
        let service = Self::default();
        service.set_rate("USD", NANOS_PER_UNIT);
        service
    }

    /// Creates a service from `(code, billionths per USD)` pairs.
    pub fn with_rates<'a>(rates: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let service = Self::new();
        for (code, rate) in rates {
            service.set_rate(code, rate);
        }
        service
    }

    /// Sets how many billionths of `code` one USD buys.
    pub fn set_rate(&self, code: &str, nanos_per_usd: i64) {
        self.state
            .write()
            .rates
            .insert(code.to_string(), nanos_per_usd);
    }

    /// Configures `convert` to fail as unreachable.
    pub fn set_fail_on_convert(&self, fail: bool) {
        self.state.write().fail_on_convert = fail;
    }

    /// Returns how many conversions were requested.
    pub fn conversion_count(&self) -> usize {
        self.state.read().conversions
    }
}

#[async_trait]
impl CurrencyService for InMemoryCurrencyService {
    async fn supported_currencies(&self) -> Result<Vec<String>, ServiceError> {
        let mut codes: Vec<String> = self.state.read().rates.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError> {
        let mut state = self.state.write();
        state.conversions += 1;

        if state.fail_on_convert {
            return Err(ServiceError::Unavailable(
                "currency service unreachable".to_string(),
            ));
        }

        let rate = |code: &str| {
            state
                .rates
                .get(code)
                .copied()
                .filter(|r| *r > 0)
                .ok_or_else(|| ServiceError::UnsupportedCurrency(code.to_string()))
        };
        let from_rate = rate(from.currency_code())?;
        let to_rate = rate(to_code)?;

        let converted = from.total_nanos() * i128::from(to_rate) / i128::from(from_rate);
        Money::from_nanos(to_code, converted).map_err(|e| ServiceError::InvalidArgument(e.to_string()))
    }
}
