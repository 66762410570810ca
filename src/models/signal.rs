use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// A trading signal recovered from free text.
///
/// Construction does not enforce the side-relative ordering of stop-loss and
/// take-profits; those are domain invariants checked by
/// [`crate::parsing::validator::validate`], which reports violations without
/// rejecting the signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// LONG or SHORT.
    pub side: Side,
    /// Base symbol without the quote suffix, e.g. "ETH".
    pub symbol: String,
    /// Low end of the entry range.
    pub entry_low: Decimal,
    /// High end of the entry range.
    pub entry_high: Decimal,
    /// Planned mid entry price ("PM"); equals low/high for single-value entries.
    pub entry_pm: Decimal,
    /// Stop-loss price.
    pub stop_loss: Decimal,
    /// Take-profit levels, in the order they appeared in the text.
    pub take_profits: Vec<Decimal>,
    /// Optional leverage range; single-value leverage has min == max.
    pub lev_min: Option<Decimal>,
    pub lev_max: Option<Decimal>,
    /// `#hashtag` tokens, order preserved, duplicates kept.
    pub tags: Vec<String>,
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} entry={}-{} (pm {}) sl={} tps=[{}]",
            self.side,
            self.symbol,
            self.entry_low,
            self.entry_high,
            self.entry_pm,
            self.stop_loss,
            self.take_profits
                .iter()
                .map(|tp| tp.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )?;
        if let (Some(lo), Some(hi)) = (self.lev_min, self.lev_max) {
            if lo == hi {
                write!(f, " lev={lo}x")?;
            } else {
                write!(f, " lev={lo}x-{hi}x")?;
            }
        }
        if !self.tags.is_empty() {
            write!(f, " {}", self.tags.join(" "))?;
        }
        Ok(())
    }
}
