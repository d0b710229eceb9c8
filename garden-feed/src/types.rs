//! Upstream endpoint identification and the raw payload they produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three documents published by the stock API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// Gear and seed shop stock (`/api/stock?type=gear-seeds`).
    GearSeeds,
    /// Egg shop stock (`/api/stock?type=egg`).
    Eggs,
    /// Current weather and temperature (`/api/stock/weather`).
    Weather,
}

impl Endpoint {
    /// Short stable name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GearSeeds => "gear-seeds",
            Self::Eggs => "egg",
            Self::Weather => "weather",
        }
    }

    /// Returns all endpoints in fetch order.
    pub fn all() -> &'static [Endpoint] {
        &[Self::GearSeeds, Self::Eggs, Self::Weather]
    }

    /// Build the request URL against `base`, with `ts` as the cache-buster.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base` cannot be joined with the path.
    pub fn url(&self, base: &url::Url, ts: i64) -> Result<url::Url, url::ParseError> {
        let ts = ts.to_string();
        let mut url = match self {
            Self::GearSeeds | Self::Eggs => base.join("/api/stock")?,
            Self::Weather => base.join("/api/stock/weather")?,
        };
        {
            let mut query = url.query_pairs_mut();
            match self {
                Self::GearSeeds | Self::Eggs => {
                    query.append_pair("type", self.name());
                    query.append_pair("ts", &ts);
                }
                Self::Weather => {
                    query.append_pair("ts", &ts);
                    query.append_pair("_", &ts);
                }
            }
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped upstream response for one observation.
///
/// Each document is kept as raw JSON; shape checks happen during
/// normalization, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Gear/seeds document.
    pub stock: serde_json::Value,
    /// Egg document.
    pub eggs: serde_json::Value,
    /// Weather document.
    pub weather: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> url::Url {
        url::Url::parse("https://growagardenstock.com").expect("base url")
    }

    #[test]
    fn gear_seeds_url_has_type_and_cache_buster() {
        let url = Endpoint::GearSeeds.url(&base(), 1700).expect("url");
        assert_eq!(
            url.as_str(),
            "https://growagardenstock.com/api/stock?type=gear-seeds&ts=1700"
        );
    }

    #[test]
    fn egg_url_uses_egg_type() {
        let url = Endpoint::Eggs.url(&base(), 42).expect("url");
        assert_eq!(
            url.as_str(),
            "https://growagardenstock.com/api/stock?type=egg&ts=42"
        );
    }

    #[test]
    fn weather_url_repeats_timestamp() {
        let url = Endpoint::Weather.url(&base(), 9).expect("url");
        assert_eq!(
            url.as_str(),
            "https://growagardenstock.com/api/stock/weather?ts=9&_=9"
        );
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::GearSeeds.to_string(), "gear-seeds");
        assert_eq!(Endpoint::Eggs.to_string(), "egg");
        assert_eq!(Endpoint::Weather.to_string(), "weather");
        assert_eq!(Endpoint::all().len(), 3);
    }
}
