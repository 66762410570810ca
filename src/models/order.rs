use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// OrderKind / OrderSide
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Limit,
    Stop,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Stop => write!(f, "STOP"),
        }
    }
}

/// Exchange-side direction of a single order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "Buy"),
            OrderSide::Sell => write!(f, "Sell"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderIntent
// ---------------------------------------------------------------------------

/// One row of an order plan. Created once by the planner and consumed once
/// by the order sink; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub kind: OrderKind,
    pub side: OrderSide,
    /// Full exchange symbol including the quote suffix, e.g. "ETHUSDT".
    pub symbol: String,
    /// Price, already rounded to the configured precision. None for market.
    pub price: Option<Decimal>,
    /// Quantity, already rounded to the configured precision.
    pub qty: Decimal,
    /// "ENTRY", "TP1".."TPn" or "SL".
    pub tag: String,
    pub reduce_only: bool,
    pub post_only: bool,
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} @ {} qty={}{}{}",
            self.tag,
            self.kind,
            self.side,
            self.symbol,
            self.price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "market".into()),
            self.qty,
            if self.reduce_only { " reduce-only" } else { "" },
            if self.post_only { " post-only" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// PlanConfig
// ---------------------------------------------------------------------------

/// Inputs for turning a signal into an order plan.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Fractional take-profit allocation; must sum to 1.0 and match the
    /// signal's take-profit count.
    pub tp_alloc: Vec<Decimal>,
    /// Fraction of balance risked between entry and stop. None disables sizing.
    pub risk_pct: Option<Decimal>,
    /// Account balance in quote units. None disables sizing.
    pub balance: Option<Decimal>,
    pub price_precision: u32,
    pub qty_precision: u32,
    pub use_post_only: bool,
}
