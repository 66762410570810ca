use rust_decimal::Decimal;

use crate::models::TradeSignal;

/// Front-loaded scalp profile (3 TPs → 35/35/30).
pub const PROFILE_SCALP: &str = "scalp_mack";
/// Balanced swing profile (3 TPs → 50/25/25).
pub const PROFILE_BALANCED: &str = "50_25_25";

/// Pick the take-profit allocation profile for a signal.
///
/// Priority:
/// 1. scalp keyword in the text or tags → scalp profile
/// 2. swing keyword in the text or tags → balanced profile
/// 3. a non-"auto" default profile is returned verbatim
/// 4. "auto": distance of TP1 from the entry PM decides — far targets get
///    the balanced profile, close ones the scalp profile
pub fn choose_profile(
    signal: &TradeSignal,
    default_profile: &str,
    auto_threshold_pct: Decimal,
    kw_scalp: &str,
    kw_swing: &str,
    source_text: &str,
) -> String {
    let text_lc = source_text.to_lowercase();
    let tags_lc = signal.tags.join(" ").to_lowercase();

    if !kw_scalp.is_empty() && (text_lc.contains(kw_scalp) || tags_lc.contains(kw_scalp)) {
        return PROFILE_SCALP.to_string();
    }
    if !kw_swing.is_empty() && (text_lc.contains(kw_swing) || tags_lc.contains(kw_swing)) {
        return PROFILE_BALANCED.to_string();
    }

    if default_profile != "auto" {
        return default_profile.to_string();
    }

    let pm = signal.entry_pm;
    let tp1 = match signal.take_profits.first() {
        Some(tp) => *tp,
        None => return PROFILE_SCALP.to_string(),
    };
    if pm <= Decimal::ZERO {
        return PROFILE_SCALP.to_string();
    }

    let dist_pct = ((tp1 - pm).abs() / pm) * Decimal::ONE_HUNDRED;
    if dist_pct >= auto_threshold_pct {
        PROFILE_BALANCED.to_string()
    } else {
        PROFILE_SCALP.to_string()
    }
}

/// Fractional weights for `n` take-profits under `profile`.
///
/// Only the 3-TP table depends on the profile; 4 TPs always get
/// 35/35/15/15 and any other count an equal split.
pub fn alloc_for_count(n: usize, profile: &str) -> Vec<Decimal> {
    match n {
        0 => Vec::new(),
        3 => {
            if profile == PROFILE_BALANCED {
                vec![
                    Decimal::new(50, 2),
                    Decimal::new(25, 2),
                    Decimal::new(25, 2),
                ]
            } else {
                vec![
                    Decimal::new(35, 2),
                    Decimal::new(35, 2),
                    Decimal::new(30, 2),
                ]
            }
        }
        4 => vec![
            Decimal::new(35, 2),
            Decimal::new(35, 2),
            Decimal::new(15, 2),
            Decimal::new(15, 2),
        ],
        _ => {
            let share = Decimal::ONE / Decimal::from(n as u32);
            vec![share; n]
        }
    }
}

/// Weights for a signal's take-profit count.
pub fn alloc_for_signal(signal: &TradeSignal, profile: &str) -> Vec<Decimal> {
    alloc_for_count(signal.take_profits.len(), profile)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
