//! Token identity catalog and resolver.
//!
//! Every source names assets its own way: the funding feeds use perp
//! symbols or market indexes, the lending feed uses bank addresses and the
//! staking feed uses mint addresses. The [`TokenCatalog`] is the single
//! indirection layer that maps each of those native keys to a canonical
//! [`TokenId`], so no other component ever looks at a source-specific key.
//!
//! The catalog is static configuration. It is built once, validated as a
//! whole, and never patched: any duplicate or dangling reference fails
//! construction with a [`CatalogError`] rather than producing a partial
//! catalog.
//!
//! # Example
//!
//! ```
//! use ratearb::domain::{NativeKey, TokenCatalog};
//!
//! let catalog = TokenCatalog::parse_toml(r#"
//! [[tokens]]
//! token_id = "SOL"
//! mint = "So11111111111111111111111111111111111111112"
//! perps = [{ protocol = "hyperliquid", symbol = "SOL" }]
//! "#).unwrap();
//!
//! let key = NativeKey::perp("hyperliquid", "sol");
//! assert_eq!(catalog.resolve(&key).unwrap().token_id.as_str(), "SOL");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::ids::{TokenId, Venue};
use super::leverage::LeverageCaps;
use crate::error::{CatalogError, ConfigError, Result};

/// A source-native asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeKey {
    /// Perp market by symbol on a funding venue (upper-cased).
    Perp { protocol: String, symbol: String },
    /// Perp market by numeric index on a funding venue.
    PerpIndex { protocol: String, index: u32 },
    /// Lending bank address.
    Bank(String),
    /// Token mint address.
    Mint(String),
}

impl NativeKey {
    pub fn perp(protocol: &str, symbol: &str) -> Self {
        Self::Perp {
            protocol: protocol.to_ascii_lowercase(),
            symbol: symbol.trim().to_ascii_uppercase(),
        }
    }

    pub fn perp_index(protocol: &str, index: u32) -> Self {
        Self::PerpIndex {
            protocol: protocol.to_ascii_lowercase(),
            index,
        }
    }
}

impl fmt::Display for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perp { protocol, symbol } => write!(f, "{protocol}:perp:{symbol}"),
            Self::PerpIndex { protocol, index } => write!(f, "{protocol}:perp#{index}"),
            Self::Bank(address) => write!(f, "bank:{address}"),
            Self::Mint(address) => write!(f, "mint:{address}"),
        }
    }
}

/// A perpetual market listing for a token.
#[derive(Debug, Clone, Deserialize)]
pub struct PerpListing {
    pub protocol: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub market_index: Option<u32>,
}

/// A lending bank for a token within one protocol market.
#[derive(Debug, Clone, Deserialize)]
pub struct BankListing {
    pub protocol: String,
    pub market: String,
    pub bank: String,
    #[serde(default)]
    pub max_leverage: LeverageCaps,
}

impl BankListing {
    pub fn venue(&self) -> Venue {
        Venue::lending(&self.protocol, &self.market)
    }
}

/// Static identity of one token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenIdentity {
    pub token_id: TokenId,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub asset_group: Option<String>,
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub perps: Vec<PerpListing>,
    #[serde(default)]
    pub banks: Vec<BankListing>,
}

impl TokenIdentity {
    /// Symbol shown to users, falling back to the token id.
    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(self.token_id.as_str())
    }

    /// The bank listing backing a lending venue.
    pub fn bank_at(&self, venue: &Venue) -> Option<&BankListing> {
        self.banks.iter().find(|bank| &bank.venue() == venue)
    }
}

/// Tokens treated as interchangeable collateral, e.g. liquid-staked SOL.
///
/// The base token's perpetual market proxies for members without one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetGroup {
    pub name: String,
    pub base: TokenId,
}

/// What a native key resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub token_id: TokenId,
    /// Lending venue, for bank keys.
    pub venue: Option<Venue>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    groups: Vec<AssetGroup>,
    #[serde(default)]
    tokens: Vec<TokenIdentity>,
}

/// Immutable, validated token catalog.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    identities: BTreeMap<TokenId, TokenIdentity>,
    groups: BTreeMap<String, AssetGroup>,
    index: HashMap<NativeKey, Binding>,
}

impl TokenCatalog {
    /// Load and validate a catalog from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse_toml(&content)?;
        debug!(path = %path.display(), tokens = catalog.len(), "Token catalog loaded");
        Ok(catalog)
    }

    /// Parse and validate a catalog from TOML text.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(Self::from_identities(file.tokens, file.groups)?)
    }

    /// Build the catalog, rejecting duplicate or dangling definitions.
    ///
    /// Token ids are upper-cased so configuration is case-insensitive.
    pub fn from_identities(
        identities: Vec<TokenIdentity>,
        groups: Vec<AssetGroup>,
    ) -> std::result::Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for mut identity in identities {
            let normalized = identity.token_id.as_str().trim().to_ascii_uppercase();
            if normalized.is_empty() {
                return Err(CatalogError::EmptyTokenId);
            }
            identity.token_id = TokenId::new(normalized);
            catalog.index_identity(&identity)?;
            let token_id = identity.token_id.clone();
            if catalog.identities.insert(token_id.clone(), identity).is_some() {
                return Err(CatalogError::DuplicateToken { token_id });
            }
        }

        for mut group in groups {
            group.base = TokenId::new(group.base.as_str().trim().to_ascii_uppercase());
            if !catalog.identities.contains_key(&group.base) {
                return Err(CatalogError::UnknownGroupBase {
                    group: group.name,
                    base: group.base,
                });
            }
            let name = group.name.clone();
            if catalog.groups.insert(name.clone(), group).is_some() {
                return Err(CatalogError::DuplicateGroup { group: name });
            }
        }

        for identity in catalog.identities.values() {
            if let Some(group) = &identity.asset_group {
                if !catalog.groups.contains_key(group) {
                    return Err(CatalogError::UnknownGroup {
                        token_id: identity.token_id.clone(),
                        group: group.clone(),
                    });
                }
            }
        }

        Ok(catalog)
    }

    fn index_identity(&mut self, identity: &TokenIdentity) -> std::result::Result<(), CatalogError> {
        let token_id = &identity.token_id;

        if let Some(mint) = &identity.mint {
            self.bind(NativeKey::Mint(mint.trim().to_string()), token_id, None)?;
        }
        for perp in &identity.perps {
            if let Some(symbol) = &perp.symbol {
                self.bind(NativeKey::perp(&perp.protocol, symbol), token_id, None)?;
            }
            if let Some(index) = perp.market_index {
                self.bind(NativeKey::perp_index(&perp.protocol, index), token_id, None)?;
            }
        }
        for bank in &identity.banks {
            self.bind(
                NativeKey::Bank(bank.bank.trim().to_string()),
                token_id,
                Some(bank.venue()),
            )?;
        }
        Ok(())
    }

    fn bind(
        &mut self,
        key: NativeKey,
        token_id: &TokenId,
        venue: Option<Venue>,
    ) -> std::result::Result<(), CatalogError> {
        if let Some(existing) = self.index.get(&key) {
            return Err(CatalogError::DuplicateKey {
                key: key.to_string(),
                first: existing.token_id.clone(),
                second: token_id.clone(),
            });
        }
        self.index.insert(
            key,
            Binding {
                token_id: token_id.clone(),
                venue,
            },
        );
        Ok(())
    }

    /// Resolve a source-native key. Pure lookup.
    pub fn resolve(&self, key: &NativeKey) -> Option<&Binding> {
        self.index.get(key)
    }

    pub fn identity(&self, token_id: &TokenId) -> Option<&TokenIdentity> {
        self.identities.get(token_id)
    }

    pub fn group(&self, name: &str) -> Option<&AssetGroup> {
        self.groups.get(name)
    }

    /// Base token of the token's asset group, unless the token is the base.
    pub fn group_base(&self, token_id: &TokenId) -> Option<&TokenId> {
        let group = self.identity(token_id)?.asset_group.as_deref()?;
        let base = &self.group(group)?.base;
        (base != token_id).then_some(base)
    }

    /// Tokens of an asset group, base included, in token order.
    pub fn members<'a>(&'a self, group: &'a AssetGroup) -> impl Iterator<Item = &'a TokenId> + 'a {
        self.identities.values().filter_map(move |identity| {
            let member = identity.token_id == group.base
                || identity.asset_group.as_deref() == Some(group.name.as_str());
            member.then_some(&identity.token_id)
        })
    }

    pub fn identities(&self) -> impl Iterator<Item = &TokenIdentity> {
        self.identities.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &AssetGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rust_decimal_macros::dec;

    const CATALOG: &str = r#"
[[groups]]
name = "SOL"
base = "SOL"

[[tokens]]
token_id = "sol"
asset_group = "SOL"
mint = "So11111111111111111111111111111111111111112"
perps = [
    { protocol = "hyperliquid", symbol = "SOL" },
    { protocol = "drift", market_index = 0 },
]

[[tokens.banks]]
protocol = "kamino"
market = "main"
bank = "solbank"
max_leverage = { long = 5, short = 3 }

[[tokens]]
token_id = "JITOSOL"
asset_group = "SOL"
mint = "jitomint"
banks = [{ protocol = "kamino", market = "main", bank = "jitobank" }]
"#;

    #[test]
    fn resolves_every_native_key_kind() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        let sol = TokenId::from("SOL");

        assert_eq!(catalog.resolve(&NativeKey::perp("hyperliquid", "SOL")).unwrap().token_id, sol);
        assert_eq!(catalog.resolve(&NativeKey::perp_index("drift", 0)).unwrap().token_id, sol);
        assert_eq!(
            catalog
                .resolve(&NativeKey::Mint("So11111111111111111111111111111111111111112".into()))
                .unwrap()
                .token_id,
            sol
        );

        let bank = catalog.resolve(&NativeKey::Bank("jitobank".into())).unwrap();
        assert_eq!(bank.token_id, TokenId::from("JITOSOL"));
        assert_eq!(bank.venue, Some(Venue::lending("kamino", "main")));
    }

    #[test]
    fn unknown_key_does_not_resolve() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        assert!(catalog.resolve(&NativeKey::perp("hyperliquid", "DOGE")).is_none());
        assert!(catalog.resolve(&NativeKey::perp_index("hyperliquid", 0)).is_none());
    }

    #[test]
    fn token_ids_are_upper_cased() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        assert!(catalog.identity(&TokenId::from("SOL")).is_some());
    }

    #[test]
    fn group_members_include_the_base() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        let group = catalog.group("SOL").unwrap();

        let members: Vec<&str> = catalog.members(group).map(TokenId::as_str).collect();
        assert_eq!(members, ["JITOSOL", "SOL"]);
    }

    #[test]
    fn group_base_skips_the_base_itself() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        assert_eq!(catalog.group_base(&TokenId::from("JITOSOL")), Some(&TokenId::from("SOL")));
        assert_eq!(catalog.group_base(&TokenId::from("SOL")), None);
    }

    #[test]
    fn bank_caps_are_parsed() {
        let catalog = TokenCatalog::parse_toml(CATALOG).unwrap();
        let sol = catalog.identity(&TokenId::from("SOL")).unwrap();
        let bank = sol.bank_at(&Venue::lending("kamino", "main")).unwrap();
        assert_eq!(bank.max_leverage.long, Some(dec!(5)));
        assert_eq!(bank.max_leverage.short, Some(dec!(3)));
    }

    #[test]
    fn duplicate_native_key_fails_loudly() {
        let toml = r#"
[[tokens]]
token_id = "JITOSOL"
banks = [{ protocol = "kamino", market = "main", bank = "shared" }]

[[tokens]]
token_id = "MSOL"
banks = [{ protocol = "kamino", market = "main", bank = "shared" }]
"#;
        match TokenCatalog::parse_toml(toml) {
            Err(Error::Catalog(CatalogError::DuplicateKey { first, second, .. })) => {
                assert_eq!(first, TokenId::from("JITOSOL"));
                assert_eq!(second, TokenId::from("MSOL"));
            }
            other => panic!("expected duplicate key error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_key_within_one_token_fails() {
        let toml = r#"
[[tokens]]
token_id = "SOL"
perps = [
    { protocol = "hyperliquid", symbol = "SOL" },
    { protocol = "hyperliquid", symbol = "sol" },
]
"#;
        assert!(matches!(
            TokenCatalog::parse_toml(toml),
            Err(Error::Catalog(CatalogError::DuplicateKey { .. }))
        ));
    }

    #[test]
    fn duplicate_token_id_fails() {
        let toml = r#"
[[tokens]]
token_id = "SOL"

[[tokens]]
token_id = "Sol"
"#;
        assert!(matches!(
            TokenCatalog::parse_toml(toml),
            Err(Error::Catalog(CatalogError::DuplicateToken { .. }))
        ));
    }

    #[test]
    fn dangling_group_references_fail() {
        let unknown_group = r#"
[[tokens]]
token_id = "MSOL"
asset_group = "SOL"
"#;
        assert!(matches!(
            TokenCatalog::parse_toml(unknown_group),
            Err(Error::Catalog(CatalogError::UnknownGroup { .. }))
        ));

        let unknown_base = r#"
[[groups]]
name = "SOL"
base = "SOL"

[[tokens]]
token_id = "MSOL"
asset_group = "SOL"
"#;
        assert!(matches!(
            TokenCatalog::parse_toml(unknown_base),
            Err(Error::Catalog(CatalogError::UnknownGroupBase { .. }))
        ));
    }
}
