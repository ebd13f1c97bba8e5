//! Trading symbol handling.
//!
//! Requests name pairs the application way ("BTC/USDT"); the CoinDCX candle
//! endpoint wants its own pair notation ("B-BTC_USDT").

use crate::domain::errors::PredictionError;

pub const DEFAULT_SYMBOL: &str = "BTC/USDT";

/// Known quote currencies, longest first so USDT wins over USD.
const CRYPTO_QUOTE_CURRENCIES: &[&str] = &[
    "USDT", "USDC", "BUSD", "TUSD", // Stablecoins (4 chars)
    "USD", "EUR", "GBP", "BTC", "ETH", // Traditional (3 chars)
];

/// Normalizes a crypto symbol to the slash-separated form.
///
/// Accepts "BTC/USDT", "btc/usdt" and concatenated forms such as "BTCUSDT".
pub fn normalize_crypto_symbol(symbol: &str) -> Result<String, PredictionError> {
    let symbol = symbol.trim().to_ascii_uppercase();

    if symbol.is_empty() {
        return Err(PredictionError::invalid_request(
            "Cannot normalize empty symbol",
        ));
    }

    if let Some((base, quote)) = symbol.split_once('/') {
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(PredictionError::invalid_request(format!(
                "Malformed symbol: '{}'",
                symbol
            )));
        }
        return Ok(symbol);
    }

    for quote in CRYPTO_QUOTE_CURRENCIES {
        if symbol.ends_with(quote) && symbol.len() > quote.len() {
            let base = &symbol[..symbol.len() - quote.len()];
            if base.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Ok(format!("{}/{}", base, quote));
            }
        }
    }

    Err(PredictionError::invalid_request(format!(
        "Cannot normalize crypto symbol: '{}' - no recognized quote currency",
        symbol
    )))
}

/// Converts a symbol into CoinDCX pair notation: "BTC/USDT" -> "B-BTC_USDT".
pub fn to_coindcx_pair(symbol: &str) -> Result<String, PredictionError> {
    let normalized = normalize_crypto_symbol(symbol)?;
    Ok(format!("B-{}", normalized.replace('/', "_")))
}
