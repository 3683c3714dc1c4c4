mod support;

use std::fs;

use ratearb::domain::{NativeKey, TokenCatalog, TokenId, Venue};
use ratearb::error::{CatalogError, ConfigError, Error};
use rust_decimal_macros::dec;

use support::catalog::fixture_catalog;

#[test]
fn fixture_catalog_resolves_every_feed_key() {
    let catalog = fixture_catalog();

    assert_eq!(catalog.len(), 4);
    assert_eq!(
        catalog.resolve(&NativeKey::perp("hyperliquid", "btc")).unwrap().token_id,
        TokenId::from("BTC")
    );
    assert_eq!(
        catalog.resolve(&NativeKey::perp_index("drift", 0)).unwrap().token_id,
        TokenId::from("SOL")
    );
    let bank = catalog
        .resolve(&NativeKey::Bank("EVbyPKrHG6WBfm4dLxLMJpUDY43cCAcHSpV3KYjKsktW".into()))
        .unwrap();
    assert_eq!(bank.token_id, TokenId::from("JITOSOL"));
    assert_eq!(bank.venue, Some(Venue::lending("kamino", "main")));
    assert!(catalog.resolve(&NativeKey::perp("hyperliquid", "DOGE")).is_none());
}

#[test]
fn group_members_point_at_base() {
    let catalog = fixture_catalog();

    assert_eq!(catalog.group_base(&TokenId::from("JITOSOL")), Some(&TokenId::from("SOL")));
    assert_eq!(catalog.group_base(&TokenId::from("SOL")), None);
    assert_eq!(catalog.group_base(&TokenId::from("BTC")), None);
}

#[test]
fn bank_caps_are_loaded() {
    let catalog = fixture_catalog();
    let sol = catalog.identity(&TokenId::from("SOL")).unwrap();

    let kamino = sol.bank_at(&Venue::lending("kamino", "main")).unwrap();
    assert_eq!(kamino.max_leverage.long, Some(dec!(5)));
    assert_eq!(kamino.max_leverage.short, Some(dec!(4)));
}

#[test]
fn duplicate_native_key_fails_whole_catalog() {
    let result = TokenCatalog::parse_toml(
        r#"
[[tokens]]
token_id = "MSOL"
mint = "shared"

[[tokens]]
token_id = "BSOL"
mint = "shared"
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Catalog(CatalogError::DuplicateKey { .. }))
    ));
}

#[test]
fn token_ids_are_case_insensitive_duplicates() {
    let result = TokenCatalog::parse_toml(
        r#"
[[tokens]]
token_id = "sol"

[[tokens]]
token_id = "SOL"
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Catalog(CatalogError::DuplicateToken { .. }))
    ));
}

#[test]
fn unknown_group_base_is_rejected() {
    let result = TokenCatalog::parse_toml(
        r#"
[[groups]]
name = "ETH"
base = "ETH"

[[tokens]]
token_id = "STETH"
asset_group = "ETH"
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Catalog(CatalogError::UnknownGroupBase { .. }))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = TokenCatalog::load(dir.path().join("tokens.toml"));

    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile { .. }))));
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.toml");
    fs::write(
        &path,
        r#"
[[tokens]]
token_id = "usdc"
mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
"#,
    )
    .unwrap();

    let catalog = TokenCatalog::load(&path).unwrap();
    assert!(catalog.identity(&TokenId::from("USDC")).is_some());
}
