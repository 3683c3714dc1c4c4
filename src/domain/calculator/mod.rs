//! Arbitrage calculators.
//!
//! Each calculator handles one scenario family and is a pure function of
//! the joined token bundles plus the caller's parameters:
//!
//! - **LeveragedSpot**: `(borrow + stake) * (L - 1) - (lend + stake) * L`
//! - **SpotPerps**: spot leg minus (long) or plus (short) funding
//! - **PerpsPerps**: funding differential for every venue pair
//!
//! [`best_per_group`] sits beside the registry: it sweeps leverage levels
//! and group members to find the cheapest spot leg per asset group.
//!
//! All maths is per hour; scaling to a display interval happens in
//! [`crate::domain::ranking`].
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use ratearb::domain::calculator::{CalcContext, CalcParams, CalculatorRegistry};
//! use ratearb::domain::TokenCatalog;
//!
//! let registry = CalculatorRegistry::with_defaults();
//! let bundles = BTreeMap::new();
//! let catalog = TokenCatalog::default();
//! let params = CalcParams::default();
//!
//! let result = registry.compute_all(&CalcContext::new(&bundles, &catalog, &params));
//! assert!(result.opportunities.is_empty());
//! ```

mod context;
mod spot_leg;
pub mod group_best;
pub mod leveraged_spot;
pub mod perps_perps;
pub mod spot_perps;

pub use context::{
    CalcContext, CalcParams, Calculation, FundingSource, ProxyPreference, SpotFraming,
};
pub use group_best::{best_per_group, GroupBest, GroupSweep};
pub use leveraged_spot::LeveragedSpotCalculator;
pub use perps_perps::PerpsPerpsCalculator;
pub use spot_perps::SpotPerpsCalculator;

use tracing::debug;

use crate::domain::opportunity::Scenario;

/// A calculator for one scenario family.
pub trait Calculator: Send + Sync {
    /// Unique identifier, used in logging.
    fn name(&self) -> &'static str;

    /// Scenarios this calculator can produce.
    fn scenarios(&self) -> &'static [Scenario];

    /// Compute opportunities and record what had to be skipped.
    fn compute(&self, ctx: &CalcContext<'_>) -> Calculation;
}

/// Registry of calculators.
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: Vec<Box<dyn Calculator>>,
}

impl CalculatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in calculator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LeveragedSpotCalculator::new()));
        registry.register(Box::new(SpotPerpsCalculator::new()));
        registry.register(Box::new(PerpsPerpsCalculator::new()));
        registry
    }

    /// Calculators run in registration order.
    pub fn register(&mut self, calculator: Box<dyn Calculator>) {
        self.calculators.push(calculator);
    }

    pub fn calculators(&self) -> &[Box<dyn Calculator>] {
        &self.calculators
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Run every calculator with at least one enabled scenario.
    pub fn compute_all(&self, ctx: &CalcContext<'_>) -> Calculation {
        let mut total = Calculation::default();
        for calculator in &self.calculators {
            if !calculator
                .scenarios()
                .iter()
                .any(|scenario| ctx.params.is_enabled(*scenario))
            {
                continue;
            }
            let result = calculator.compute(ctx);
            debug!(
                calculator = calculator.name(),
                opportunities = result.opportunities.len(),
                skipped = result.skipped.len(),
                "Calculator finished"
            );
            total.merge(result);
        }
        total
    }
}
