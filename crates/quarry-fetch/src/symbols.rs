//! Symbol discovery from the exchange metadata endpoint.

use quarry_types::QuarryError;
use serde::Deserialize;

use crate::DownloadClient;

/// USD-M futures exchange metadata endpoint.
pub const EXCHANGE_INFO_URL: &str = "https://fapi.binance.com/fapi/v1/exchangeInfo";

/// The subset of the exchange metadata document that discovery reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    /// Listed contracts.
    pub symbols: Vec<SymbolInfo>,
}

/// One listed contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Contract symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Listing status, e.g. `TRADING`.
    pub status: String,
    /// Contract type, e.g. `PERPETUAL`.
    #[serde(default)]
    pub contract_type: String,
    /// Quote asset, e.g. `USDT`.
    pub quote_asset: String,
}

impl SymbolInfo {
    /// Returns true for actively trading USDT-quoted perpetual contracts.
    #[must_use]
    pub fn is_usdt_perpetual(&self) -> bool {
        self.status == "TRADING" && self.contract_type == "PERPETUAL" && self.quote_asset == "USDT"
    }
}

impl ExchangeInfo {
    /// Sorted symbols of all trading USDT perpetuals.
    #[must_use]
    pub fn usdt_perpetuals(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .symbols
            .iter()
            .filter(|info| info.is_usdt_perpetual())
            .map(|info| info.symbol.clone())
            .collect();
        symbols.sort();
        symbols
    }
}

/// Fetches the exchange metadata and returns the sorted USDT perpetuals.
///
/// Not retried; a failure is fatal to the run.
///
/// # Errors
///
/// Returns [`QuarryError::SymbolDiscovery`] on any transport or decode error.
pub async fn discover_symbols(client: &DownloadClient, url: &str) -> Result<Vec<String>, QuarryError> {
    let info: ExchangeInfo = client
        .get_json(url)
        .await
        .map_err(|e| QuarryError::SymbolDiscovery(e.to_string()))?;
    Ok(info.usdt_perpetuals())
}
