use crate::models::{Side, TradeSignal};

/// Check a parsed signal against its side's price-ordering invariants.
///
/// Never fails: every violated rule contributes one human-readable issue and
/// the signal keeps flowing downstream with the list attached. Ties at the
/// boundary (SL == PM, TP == PM) count as violations.
pub fn validate(signal: &TradeSignal) -> Vec<String> {
    let mut issues = Vec::new();

    let low = signal.entry_low.min(signal.entry_high);
    let high = signal.entry_low.max(signal.entry_high);
    if signal.entry_pm < low || signal.entry_pm > high {
        issues.push("entry PM is outside the stated entry range".to_string());
    }

    let pm = signal.entry_pm;
    match signal.side {
        Side::Short => {
            if signal.stop_loss <= pm {
                issues.push("for SHORT the stop-loss must be ABOVE the entry PM".to_string());
            }
            for (i, tp) in signal.take_profits.iter().enumerate() {
                if *tp >= pm {
                    issues.push(format!(
                        "for SHORT, TP{} must be BELOW the entry PM",
                        i + 1
                    ));
                }
            }
        }
        Side::Long => {
            if signal.stop_loss >= pm {
                issues.push("for LONG the stop-loss must be BELOW the entry PM".to_string());
            }
            for (i, tp) in signal.take_profits.iter().enumerate() {
                if *tp <= pm {
                    issues.push(format!(
                        "for LONG, TP{} must be ABOVE the entry PM",
                        i + 1
                    ));
                }
            }
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
