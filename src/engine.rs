//! One refresh cycle: normalize, join, calculate, rank.
//!
//! The engine is a pure function of (snapshot, catalog, parameters). It
//! holds no rate data between calls; every [`Engine::analyze`] recomputes
//! bundles and opportunities from scratch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use rust_decimal::Decimal;

use crate::domain::calculator::{best_per_group, CalcContext, CalcParams, CalculatorRegistry};
use crate::domain::{
    join, rank, Direction, ExclusionReport, Interval, Leverage, RankedOpportunity, SkipReason, SkippedScenario,
    SortKey, TokenBundle, TokenCatalog, TokenId,
};
use crate::source::{normalize, Normalized, SourceDefaults, SourcePayload};

/// Raw payloads gathered for one refresh.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    payloads: Vec<SourcePayload>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(payloads: Vec<SourcePayload>) -> Self {
        Self {
            payloads,
            fetched_at: None,
        }
    }

    /// Attach the fetch time. Informational only; never validated.
    #[must_use]
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    pub fn payloads(&self) -> &[SourcePayload] {
        &self.payloads
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Everything the caller chooses for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisParams {
    pub calc: CalcParams,
    pub interval: Interval,
    pub sort: SortKey,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub interval: Interval,
    pub fetched_at: Option<DateTime<Utc>>,
    pub bundles: BTreeMap<TokenId, TokenBundle>,
    pub opportunities: Vec<RankedOpportunity>,
    pub exclusions: ExclusionReport,
}

/// Cheapest spot leg of one asset group and direction, scaled.
#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub group: String,
    pub direction: Direction,
    pub spot: RankedOpportunity,
    pub hedges: Vec<RankedOpportunity>,
}

/// Result of a per-group leverage sweep.
#[derive(Debug, Clone, Serialize)]
pub struct GroupAnalysis {
    pub interval: Interval,
    pub fetched_at: Option<DateTime<Utc>>,
    pub max_leverage: Decimal,
    pub groups: Vec<GroupEntry>,
    pub exclusions: ExclusionReport,
}

/// The rate pipeline, bound to one immutable catalog.
pub struct Engine {
    catalog: TokenCatalog,
    defaults: SourceDefaults,
    registry: CalculatorRegistry,
}

impl Engine {
    /// Engine with every built-in calculator.
    pub fn new(catalog: TokenCatalog, defaults: SourceDefaults) -> Self {
        Self::with_registry(catalog, defaults, CalculatorRegistry::with_defaults())
    }

    pub fn with_registry(catalog: TokenCatalog, defaults: SourceDefaults, registry: CalculatorRegistry) -> Self {
        Self {
            catalog,
            defaults,
            registry,
        }
    }

    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    /// Normalize every payload and join the records into bundles.
    pub fn bundles(&self, snapshot: &Snapshot) -> (BTreeMap<TokenId, TokenBundle>, ExclusionReport) {
        let mut normalized = Normalized::default();
        for payload in snapshot.payloads() {
            normalized.merge(normalize(payload, &self.catalog, &self.defaults));
        }

        let mut exclusions = ExclusionReport::new();
        exclusions.add_unresolved(normalized.unresolved);
        exclusions.add_malformed(normalized.malformed);

        let bundles = join(&normalized.records, &self.catalog);
        debug!(
            records = normalized.records.len(),
            tokens = bundles.len(),
            "Records joined"
        );
        (bundles, exclusions)
    }

    /// Run one full refresh cycle over `snapshot`.
    pub fn analyze(&self, snapshot: &Snapshot, params: &AnalysisParams) -> Analysis {
        let (bundles, mut exclusions) = self.bundles(snapshot);

        let ctx = CalcContext::new(&bundles, &self.catalog, &params.calc);
        let calculation = self.registry.compute_all(&ctx);
        exclusions.add_skipped(calculation.skipped);

        let ranking = rank(calculation.opportunities, params.interval, params.sort);
        exclusions.add_skipped(ranking.overflowed);
        let opportunities = ranking.ranked;
        info!(
            tokens = bundles.len(),
            opportunities = opportunities.len(),
            unresolved = exclusions.unresolved().len(),
            malformed = exclusions.malformed().len(),
            skipped = exclusions.skipped().len(),
            interval = %params.interval,
            "Analysis complete"
        );

        Analysis {
            interval: params.interval,
            fetched_at: snapshot.fetched_at(),
            bundles,
            opportunities,
            exclusions,
        }
    }

    /// Best spot leg per asset group across whole leverage levels up to
    /// `max_leverage`, hedged on the group base's perps.
    ///
    /// `params.calc.leverage` is ignored; every other parameter applies.
    pub fn best_by_group(&self, snapshot: &Snapshot, params: &AnalysisParams, max_leverage: Decimal) -> GroupAnalysis {
        let (bundles, mut exclusions) = self.bundles(snapshot);
        let levels = Leverage::sweep(max_leverage);

        let ctx = CalcContext::new(&bundles, &self.catalog, &params.calc);
        let sweep = best_per_group(&ctx, &levels);
        exclusions.add_skipped(sweep.skipped);

        let mut groups = Vec::with_capacity(sweep.entries.len());
        for entry in sweep.entries {
            let spot = match RankedOpportunity::new(entry.spot.clone(), params.interval) {
                Ok(spot) => spot,
                Err(err) => {
                    exclusions.add_skipped([SkippedScenario::from_opportunity(
                        &entry.spot,
                        SkipReason::InvalidResult { reason: err.to_string() },
                    )]);
                    continue;
                }
            };
            let hedges = rank(entry.hedges, params.interval, params.sort);
            exclusions.add_skipped(hedges.overflowed);
            groups.push(GroupEntry {
                group: entry.group,
                direction: entry.direction,
                spot,
                hedges: hedges.ranked,
            });
        }
        info!(
            groups = groups.len(),
            levels = levels.len(),
            skipped = exclusions.skipped().len(),
            interval = %params.interval,
            "Group sweep complete"
        );

        GroupAnalysis {
            interval: params.interval,
            fetched_at: snapshot.fetched_at(),
            max_leverage,
            groups,
            exclusions,
        }
    }
}
