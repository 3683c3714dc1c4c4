//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical token identifier (e.g. `SOL`, `JITOSOL`, `USDC`).
///
/// Every source-native key is resolved to one of these before joining.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Create a new TokenId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the token ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where a rate was observed.
///
/// For funding rates this is the exchange display name (`Hyperliquid`,
/// `Drift`, ...). For lending rates it is the protocol and market, rendered
/// as `protocol(market)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Venue(String);

impl Venue {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Venue of a lending market.
    pub fn lending(protocol: &str, market: &str) -> Self {
        Self(format!("{protocol}({market})"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Venue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lending_venue_renders_protocol_and_market() {
        assert_eq!(Venue::lending("kamino", "main").as_str(), "kamino(main)");
    }

    #[test]
    fn token_ids_order_lexically() {
        let mut ids = vec![TokenId::from("SOL"), TokenId::from("BTC"), TokenId::from("JITOSOL")];
        ids.sort();
        let names: Vec<_> = ids.iter().map(TokenId::as_str).collect();
        assert_eq!(names, ["BTC", "JITOSOL", "SOL"]);
    }
}
