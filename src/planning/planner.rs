use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{OrderIntent, OrderKind, OrderSide, PlanConfig, TradeSignal};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("stop-loss equals the entry PM, risk distance is zero")]
    ZeroRiskDistance,
}

/// Total quantity from risk sizing: risk budget divided by the per-unit
/// adverse distance between entry PM and stop-loss.
fn risk_qty(balance: Decimal, risk_pct: Decimal, pm: Decimal, sl: Decimal) -> Result<Decimal, PlanError> {
    let dist = (sl - pm).abs();
    if dist <= Decimal::ZERO {
        return Err(PlanError::ZeroRiskDistance);
    }
    Ok((balance * risk_pct) / dist)
}

/// Turn a signal into an ordered sequence of order intents.
///
/// Emits one ENTRY limit at the PM, one reduce-only TP limit per take-profit
/// level (in input order, quantities split by the allocation weights) and a
/// final reduce-only SL stop for the full quantity. When balance or risk are
/// unconfigured the plan is still produced with zero quantities, for dry
/// display. Prices and quantities are rounded to the configured precisions
/// at emission time.
pub fn build_plan(
    signal: &TradeSignal,
    cfg: &PlanConfig,
    symbol_suffix: &str,
) -> Result<Vec<OrderIntent>, PlanError> {
    let qty_total = match (cfg.balance, cfg.risk_pct) {
        (Some(balance), Some(risk_pct)) => {
            risk_qty(balance, risk_pct, signal.entry_pm, signal.stop_loss)?
        }
        _ => Decimal::ZERO,
    };

    let symbol = format!("{}{}", signal.symbol.to_uppercase(), symbol_suffix);
    let entry_side = match signal.side {
        crate::models::Side::Short => OrderSide::Sell,
        crate::models::Side::Long => OrderSide::Buy,
    };
    let exit_side = entry_side.opposite();

    let mut plan = Vec::with_capacity(2 + signal.take_profits.len());

    plan.push(OrderIntent {
        kind: OrderKind::Limit,
        side: entry_side,
        symbol: symbol.clone(),
        price: Some(signal.entry_pm.round_dp(cfg.price_precision)),
        qty: qty_total.round_dp(cfg.qty_precision),
        tag: "ENTRY".into(),
        reduce_only: false,
        post_only: cfg.use_post_only,
    });

    for (i, (tp_price, frac)) in signal
        .take_profits
        .iter()
        .zip(cfg.tp_alloc.iter())
        .enumerate()
    {
        plan.push(OrderIntent {
            kind: OrderKind::Limit,
            side: exit_side,
            symbol: symbol.clone(),
            price: Some(tp_price.round_dp(cfg.price_precision)),
            qty: (qty_total * frac).round_dp(cfg.qty_precision),
            tag: format!("TP{}", i + 1),
            reduce_only: true,
            post_only: cfg.use_post_only,
        });
    }

    plan.push(OrderIntent {
        kind: OrderKind::Stop,
        side: exit_side,
        symbol,
        price: Some(signal.stop_loss.round_dp(cfg.price_precision)),
        qty: qty_total.round_dp(cfg.qty_precision),
        tag: "SL".into(),
        reduce_only: true,
        post_only: false,
    });

    Ok(plan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
