//! Exchange metadata — instrument listings and type filtering.
//!
//! One request against the exchange-symbol-list endpoint, parsed into typed
//! instruments. A missing token degrades to an empty listing before any
//! network call is made; transport faults fail the call itself.

use super::eodhd::EodhdClient;
use super::provider::DataError;
use serde::{Deserialize, Serialize};

/// Default exchange code for listings.
pub const DEFAULT_EXCHANGE: &str = "NYSE";

/// Default instrument category for ticker filtering.
pub const COMMON_STOCK: &str = "Common Stock";

/// One tradable instrument as listed by the exchange endpoint.
///
/// Field names follow the provider's PascalCase JSON keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "Exchange", default)]
    pub exchange: String,
    #[serde(rename = "Currency", default)]
    pub currency: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
}

/// List the instruments of an exchange.
///
/// Returns an empty list without touching the network when no token is
/// configured; any other failure propagates as a typed error.
pub fn list_exchange(client: &EodhdClient, exchange: &str) -> Result<Vec<Instrument>, DataError> {
    if !client.has_token() {
        return Ok(Vec::new());
    }
    client.exchange_symbol_list(exchange)
}

/// Codes of all instruments whose type matches `kind`, in listing order.
pub fn filter_by_kind(instruments: &[Instrument], kind: &str) -> Vec<String> {
    instruments
        .iter()
        .filter(|i| i.kind == kind)
        .map(|i| i.code.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(code: &str, kind: &str) -> Instrument {
        Instrument {
            code: code.into(),
            name: String::new(),
            country: "USA".into(),
            exchange: "NYSE".into(),
            currency: "USD".into(),
            kind: kind.into(),
        }
    }

    #[test]
    fn filter_selects_matching_kind_in_order() {
        let listing = vec![
            instrument("AAA", COMMON_STOCK),
            instrument("BBB", "ETF"),
            instrument("CCC", COMMON_STOCK),
            instrument("DDD", "Preferred Stock"),
        ];
        assert_eq!(filter_by_kind(&listing, COMMON_STOCK), vec!["AAA", "CCC"]);
        assert_eq!(filter_by_kind(&listing, "ETF"), vec!["BBB"]);
        assert!(filter_by_kind(&listing, "Fund").is_empty());
    }

    #[test]
    fn missing_token_yields_empty_listing() {
        let client = EodhdClient::new("");
        let listing = list_exchange(&client, DEFAULT_EXCHANGE).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn instrument_deserializes_provider_keys() {
        let json = r#"{"Code":"MCD","Name":"McDonald's Corp","Country":"USA",
                       "Exchange":"NYSE","Currency":"USD","Type":"Common Stock"}"#;
        let inst: Instrument = serde_json::from_str(json).unwrap();
        assert_eq!(inst.code, "MCD");
        assert_eq!(inst.kind, COMMON_STOCK);
    }
}
