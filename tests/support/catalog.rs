use std::path::PathBuf;

use ratearb::domain::TokenCatalog;

/// Path of a file under `tests/fixtures`.
pub fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(path)
}

/// The fixture catalog: SOL (group base), JITOSOL, BTC and USDC.
pub fn fixture_catalog() -> TokenCatalog {
    TokenCatalog::load(fixture("tokens.toml")).expect("fixture catalog")
}

/// A catalog with one token `SOL` on Hyperliquid, Drift and one Kamino bank.
pub fn sol_catalog() -> TokenCatalog {
    TokenCatalog::parse_toml(
        r#"
[[tokens]]
token_id = "SOL"
mint = "solmint"
perps = [
    { protocol = "hyperliquid", symbol = "SOL" },
    { protocol = "drift", market_index = 0 },
]
banks = [{ protocol = "kamino", market = "main", bank = "solbank" }]
"#,
    )
    .expect("sol catalog")
}
