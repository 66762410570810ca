use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Side, TradeSignal};

/// Number token: integer or decimal, `.` and `,` both accepted as separator.
const NUM: &str = r"[-+]?\d+(?:[.,]\d+)?";

static RE_SIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(long|short)\b").unwrap());

// Symbol tiers, first match wins:
//   1. `$COIN`, `$COIN/USDT` or `$COINUSDT` right after the side keyword
//   2. any uppercase alphanumeric token glued to USDT
//   3. an uppercase word right after the side keyword
static RE_SYM_DOLLAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:long|short)\b\s+\$([a-z0-9]{2,15})(?:/usdt|usdt)?").unwrap()
});
static RE_SYM_USDT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z0-9]{2,15})USDT\b").unwrap());
static RE_SYM_AFTER_SIDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:LONG|SHORT)\b\s+([A-Z]{2,10})\b").unwrap());

static RE_ENTRY_LADDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)entradas?\s+escalonadas?\s*:\s*({NUM})\s*[-–]\s*({NUM})"
    ))
    .unwrap()
});
static RE_ENTRY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)entrada\s*:\s*({NUM})\s*[-–]\s*({NUM})\s*(?:\((?:pm|média)\s*:\s*({NUM})\))?"
    ))
    .unwrap()
});
static RE_ENTRY_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)entrada\s*:\s*({NUM})")).unwrap());

static RE_SL: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"(?i)\bsl\s*:\s*({NUM})")).unwrap());
static RE_STOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\bstop(?:\s*loss)?\s*:\s*({NUM})")).unwrap());

static RE_TPS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btps?\s*:\s*([^\n\r]+)").unwrap());
static RE_TP_N: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\btp\d+\s*:\s*({NUM})")).unwrap());
static RE_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(NUM).unwrap());

static RE_LEV_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)alavancagem\s*:\s*({NUM})\s*x\s*(?:a|–|-|to|até)\s*({NUM})\s*x?"
    ))
    .unwrap()
});
static RE_LEV_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)alavancagem\s*:\s*({NUM})\s*x\b")).unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no LONG/SHORT keyword found")]
    MissingSide,

    #[error("could not infer the symbol")]
    MissingSymbol,

    #[error("could not read the entry price or range")]
    MissingEntry,

    #[error("no stop-loss found")]
    MissingStopLoss,

    #[error("no take-profit levels found")]
    MissingTakeProfits,

    #[error("unreadable number: {0}")]
    BadNumber(String),
}

/// Cheap admission filter: does this text even look like a trade signal?
///
/// True iff a side keyword is present together with at least one of
/// entry / TP / SL vocabulary (case-insensitive substring checks). This is
/// not validation; it only gates the expensive parse.
pub fn looks_like_signal(text: &str) -> bool {
    let t = text.to_lowercase();
    let has_side = t.contains("long") || t.contains("short");
    let has_entry = t.contains("entrada") || t.contains("entry");
    let has_tp = t.contains("tp");
    let has_sl = t.contains("sl") || t.contains("stop");
    has_side && (has_entry || has_tp || has_sl)
}

/// Parse free text into a [`TradeSignal`].
///
/// Tolerant of the format variations seen in the wild:
/// - `LONG $POPCAT/USDT` / `🟢 LONG – SOLUSDT` / `SHORT ETH`
/// - `Entrada: 0.027` (single value) / `Entrada: 173.5-177 (pm: 175)`
/// - `Entradas Escalonadas: 173.50-177.00` (midpoint becomes the PM)
/// - `TPs: 0.3296, 0.3380, ...` or `TP1: ... TP2: ...`
/// - `Alavancagem: 3x a 15x` or `Alavancagem: 5x`
///
/// Each field is tried against its grammars in a fixed order, first success
/// wins; a missing required field fails the whole parse.
pub fn parse(text: &str) -> Result<TradeSignal, ParseError> {
    let raw = text.trim();

    // Side
    let side_match = RE_SIDE.find(raw).ok_or(ParseError::MissingSide)?;
    let side = Side::from_keyword(side_match.as_str()).ok_or(ParseError::MissingSide)?;

    // Symbol
    let symbol = RE_SYM_DOLLAR
        .captures(raw)
        .or_else(|| RE_SYM_USDT.captures(raw))
        .or_else(|| RE_SYM_AFTER_SIDE.captures(raw))
        .map(|c| c[1].to_uppercase())
        .ok_or(ParseError::MissingSymbol)?;

    // Entry: laddered range → classic range (optional explicit pm) → single value
    let (entry_low, entry_high, entry_pm) = if let Some(c) = RE_ENTRY_LADDER.captures(raw) {
        let a = num(&c[1])?;
        let b = num(&c[2])?;
        let (low, high) = (a.min(b), a.max(b));
        (low, high, midpoint(low, high))
    } else if let Some(c) = RE_ENTRY_RANGE.captures(raw) {
        let a = num(&c[1])?;
        let b = num(&c[2])?;
        let (low, high) = (a.min(b), a.max(b));
        let pm = match c.get(3) {
            Some(m) => num(m.as_str())?,
            None => midpoint(low, high),
        };
        (low, high, pm)
    } else if let Some(c) = RE_ENTRY_SINGLE.captures(raw) {
        let v = num(&c[1])?;
        (v, v, v)
    } else {
        return Err(ParseError::MissingEntry);
    };

    // Stop-loss
    let stop_loss = RE_SL
        .captures(raw)
        .or_else(|| RE_STOP.captures(raw))
        .map(|c| num(&c[1]))
        .ok_or(ParseError::MissingStopLoss)??;

    // Take-profits: a labelled line wins; otherwise every TP<n> occurrence
    let mut take_profits = Vec::new();
    if let Some(c) = RE_TPS_LINE.captures(raw) {
        for m in RE_NUM.find_iter(&c[1]) {
            take_profits.push(num(m.as_str())?);
        }
    }
    if take_profits.is_empty() {
        for c in RE_TP_N.captures_iter(raw) {
            take_profits.push(num(&c[1])?);
        }
    }
    if take_profits.is_empty() {
        return Err(ParseError::MissingTakeProfits);
    }

    // Leverage (optional)
    let (lev_min, lev_max) = if let Some(c) = RE_LEV_RANGE.captures(raw) {
        (Some(num(&c[1])?), Some(num(&c[2])?))
    } else if let Some(c) = RE_LEV_SINGLE.captures(raw) {
        let v = num(&c[1])?;
        (Some(v), Some(v))
    } else {
        (None, None)
    };

    // Tags: order preserved, duplicates kept
    let tags = RE_TAG
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect();

    Ok(TradeSignal {
        side,
        symbol,
        entry_low,
        entry_high,
        entry_pm,
        stop_loss,
        take_profits,
        lev_min,
        lev_max,
        tags,
    })
}

fn num(s: &str) -> Result<Decimal, ParseError> {
    let normalized = s.replace(',', ".");
    Decimal::from_str(normalized.trim_start_matches('+'))
        .map_err(|_| ParseError::BadNumber(s.to_string()))
}

fn midpoint(low: Decimal, high: Decimal) -> Decimal {
    (low + high) / Decimal::TWO
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
