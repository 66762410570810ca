pub mod order;
pub mod signal;

pub use order::{OrderIntent, OrderKind, OrderSide, PlanConfig};
pub use signal::TradeSignal;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ChatRef
// ---------------------------------------------------------------------------

/// A chat reference: either a numeric platform id or a normalized handle
/// (lower-cased, without the `@` sigil). Two refs compare equal iff their
/// normalized forms match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChatRef {
    Id(i64),
    Handle(String),
}

impl ChatRef {
    /// Parse a raw chat key: `-100123...` becomes `Id`, anything else is
    /// treated as a handle and normalized.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Some(ChatRef::Id(id));
        }
        Some(ChatRef::Handle(raw.trim_start_matches('@').to_lowercase()))
    }

    pub fn id(id: i64) -> Self {
        ChatRef::Id(id)
    }

    pub fn handle(handle: &str) -> Self {
        ChatRef::Handle(handle.trim_start_matches('@').to_lowercase())
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{id}"),
            ChatRef::Handle(h) => write!(f, "@{h}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Trade direction as stated in the signal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LONG" => Some(Side::Long),
            "SHORT" => Some(Side::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RoutingDecision
// ---------------------------------------------------------------------------

/// Immutable routing outcome for one inbound message, built by the router
/// and passed alongside the message into the pipeline. Never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Numeric id of the source chat.
    pub source_chat_id: i64,
    /// Normalized handle of the source chat, when it has one.
    pub source_handle: Option<String>,
    /// Display title of the source chat.
    pub source_title: String,
    /// Thread-root message id extracted from reply metadata, if any.
    pub thread_root: Option<i64>,
    /// Thread id resolved from the topic cache, if known.
    pub thread_id: Option<i64>,
    /// Thread title resolved from the topic cache, if known.
    pub thread_title: Option<String>,
    /// Where output for this message goes.
    pub target: ChatRef,
    /// When set, emit a short notification instead of forward + report.
    pub notify_only: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
