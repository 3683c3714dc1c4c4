//! Source-agnostic domain logic: rates, identities, bundles and opportunities.

mod bundle;
mod catalog;
mod exclusion;
mod ids;
mod interval;
mod leverage;
mod opportunity;
mod rate;
mod ranking;

pub mod calculator;
pub mod error;

// Core domain types
pub use ids::{TokenId, Venue};
pub use leverage::{Direction, Leverage, LeverageCaps};
pub use rate::{
    rebase_to_hourly, NativeInterval, RateKind, RateRecord, RateSource, RateUnit, HOURS_PER_YEAR, MAX_RATE_PER_HOUR,
};

// Identity resolution
pub use catalog::{AssetGroup, BankListing, Binding, NativeKey, PerpListing, TokenCatalog, TokenIdentity};

// Join and results
pub use bundle::{join, SpotMarket, TokenBundle};
pub use exclusion::{ExclusionReport, MalformedRecord, SkipReason, SkippedScenario, UnresolvedKey};
pub use opportunity::{Component, Opportunity, OpportunityBuilder, Scenario};

// Ranking
pub use interval::Interval;
pub use ranking::{rank, RankedOpportunity, Ranking, SortKey};
