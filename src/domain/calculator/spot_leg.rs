//! Leveraged spot leg.
//!
//! A spot position at leverage `L` lends `L` units of one asset and borrows
//! `L - 1` units of another (or the same) asset on one lending market. Per
//! hour it costs
//!
//! ```text
//! (borrow + stake_borrowed) * (L - 1) - (lend + stake_lent) * L
//! ```
//!
//! where staking yield accrues to whoever holds the yield-bearing token:
//! the lender earns it, the borrower owes it. Stake counts as zero when the
//! token has no staking rate.

use rust_decimal::Decimal;

use super::context::{CalcContext, SpotFraming};
use crate::domain::bundle::{SpotMarket, TokenBundle};
use crate::domain::exclusion::SkipReason;
use crate::domain::ids::{TokenId, Venue};
use crate::domain::leverage::{Direction, LeverageCaps};
use crate::domain::opportunity::Component;
use crate::domain::rate::RateKind;

/// One side of the leg: which token, its market and staking rate.
#[derive(Clone, Copy)]
struct Side<'a> {
    token_id: &'a TokenId,
    market: &'a SpotMarket,
    stake: Option<Decimal>,
}

/// Build the components of a spot leg at `venue`, or explain why not.
///
/// Returns `Ok(None)` when the framing does not apply to this token at all
/// (the token is its own quote asset).
pub(crate) fn spot_leg(
    ctx: &CalcContext<'_>,
    bundle: &TokenBundle,
    venue: &Venue,
    direction: Direction,
) -> Result<Option<Vec<Component>>, SkipReason> {
    let Some(own_market) = bundle.spot.get(venue) else {
        return Err(SkipReason::MissingData {
            kinds: vec![RateKind::Lend, RateKind::Borrow],
        });
    };
    let own = Side {
        token_id: &bundle.token_id,
        market: own_market,
        stake: bundle.stake,
    };

    let (lent, borrowed) = match &ctx.params.framing {
        SpotFraming::SameAsset => (own, own),
        SpotFraming::Quote(quote_id) => {
            if quote_id == &bundle.token_id {
                return Ok(None);
            }
            let quote = ctx
                .bundle(quote_id)
                .and_then(|quote_bundle| {
                    quote_bundle.spot.get(venue).map(|market| Side {
                        token_id: &quote_bundle.token_id,
                        market,
                        stake: quote_bundle.stake,
                    })
                })
                .ok_or_else(|| SkipReason::MissingQuoteMarket {
                    quote: quote_id.clone(),
                })?;
            match direction {
                Direction::Long => (own, quote),
                Direction::Short => (quote, own),
            }
        }
    };

    let lend = lent.market.lend;
    let borrow = borrowed.market.borrow;
    let (Some(lend), Some(borrow)) = (lend, borrow) else {
        let mut kinds = Vec::new();
        if lend.is_none() {
            kinds.push(RateKind::Lend);
        }
        if borrow.is_none() {
            kinds.push(RateKind::Borrow);
        }
        return Err(SkipReason::MissingData { kinds });
    };

    let leverage = ctx.params.leverage.value();
    let caps = [lent.market.max_leverage, borrowed.market.max_leverage];
    if let Some(cap) = LeverageCaps::effective(direction, &caps) {
        if leverage > cap {
            return Err(SkipReason::LeverageAboveCap {
                cap,
                requested: leverage,
            });
        }
    }

    let lent_weight = -leverage;
    let borrowed_weight = leverage - Decimal::ONE;

    let mut components = vec![Component::new(
        format!("borrow {}", borrowed.token_id),
        borrowed.token_id.clone(),
        Some(venue.clone()),
        RateKind::Borrow,
        borrow,
        borrowed_weight,
    )];
    if let Some(stake) = borrowed.stake {
        components.push(Component::new(
            format!("stake owed on borrowed {}", borrowed.token_id),
            borrowed.token_id.clone(),
            None,
            RateKind::Stake,
            stake,
            borrowed_weight,
        ));
    }
    components.push(Component::new(
        format!("lend {}", lent.token_id),
        lent.token_id.clone(),
        Some(venue.clone()),
        RateKind::Lend,
        lend,
        lent_weight,
    ));
    if let Some(stake) = lent.stake {
        components.push(Component::new(
            format!("stake earned on lent {}", lent.token_id),
            lent.token_id.clone(),
            None,
            RateKind::Stake,
            stake,
            lent_weight,
        ));
    }

    Ok(Some(components))
}
