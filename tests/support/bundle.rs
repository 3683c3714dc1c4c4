use ratearb::domain::{RateRecord, RateSource, TokenId, Venue};
use rust_decimal::Decimal;

pub fn kamino() -> Venue {
    Venue::lending("kamino", "main")
}

pub fn lend(token: &str, per_hour: Decimal) -> RateRecord {
    RateRecord::lend(TokenId::from(token), kamino(), per_hour)
}

pub fn borrow(token: &str, per_hour: Decimal) -> RateRecord {
    RateRecord::borrow(TokenId::from(token), kamino(), per_hour)
}

pub fn stake(token: &str, per_hour: Decimal) -> RateRecord {
    RateRecord::stake(TokenId::from(token), per_hour)
}

pub fn funding(token: &str, venue: &str, per_hour: Decimal) -> RateRecord {
    RateRecord::funding(TokenId::from(token), RateSource::Hyperliquid, Venue::from(venue), per_hour)
}
