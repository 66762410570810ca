use anyhow::Context;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::env;
use std::str::FromStr;

use crate::models::ChatRef;

/// Trading defaults used by the order planner.
#[derive(Debug, Clone)]
pub struct TradeDefaults {
    pub symbol_suffix: String,
    pub price_precision: u32,
    pub qty_precision: u32,
    /// None (empty env value) disables sizing: plans come out with zero qty.
    pub risk_pct: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub tp_profile: String,
    pub tp_auto_threshold_pct: Decimal,
    pub kw_scalp: String,
    pub kw_swing: String,
}

/// Process configuration, loaded once at boot from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Session identity (opaque to this core, consumed by the session backend)
    pub api_id: i64,
    pub api_hash: String,
    pub session_name: String,

    /// Source chats to listen on. Empty means discovery mode.
    pub sources: Vec<ChatRef>,
    /// Per-chat thread allow-list. None means no restriction is configured
    /// anywhere; a chat missing from a Some(..) map is unrestricted, a chat
    /// present with an empty set is fully denied.
    pub thread_allowlist: Option<HashMap<ChatRef, HashSet<i64>>>,

    /// Global fallback destination.
    pub default_target: ChatRef,
    /// Destination overrides keyed by (chat, optional thread id).
    pub target_map: HashMap<(ChatRef, Option<i64>), ChatRef>,
    /// Keys whose traffic gets a notification instead of a full forward.
    pub notify_only: HashSet<(ChatRef, Option<i64>)>,

    // Advisory scorer
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    pub trade: TradeDefaults,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let sources = parse_sources(
            env::var("SOURCE_CHATS").ok().as_deref(),
            env::var("SOURCE_CHAT").ok().as_deref(),
        );

        // Allow-list: TOPIC_MAP wins; TOPIC_ID applies one thread id to every
        // configured source. A TOPIC_MAP that is set but not valid JSON is a
        // hard startup error (fail closed, never silently unrestricted).
        let raw_topic_map = env::var("TOPIC_MAP").ok().filter(|s| !s.trim().is_empty());
        let thread_allowlist = match raw_topic_map {
            Some(raw) => Some(parse_topic_map(&raw).context("invalid TOPIC_MAP")?),
            None => parse_topic_id(env::var("TOPIC_ID").ok().as_deref(), &sources),
        };

        let default_target = env::var("TARGET_CHAT")
            .ok()
            .and_then(|s| ChatRef::parse(&s))
            .unwrap_or_else(|| ChatRef::handle("me"));

        let target_map = match env::var("TARGET_MAP").ok().filter(|s| !s.trim().is_empty()) {
            Some(raw) => parse_target_map(&raw).context("invalid TARGET_MAP")?,
            None => HashMap::new(),
        };

        let notify_only = match env::var("NOTIFY_ONLY").ok().filter(|s| !s.trim().is_empty()) {
            Some(raw) => parse_notify_only(&raw),
            None => HashSet::new(),
        };

        Ok(Self {
            api_id: env::var("TG_API_ID")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .context("TG_API_ID must be numeric")?,
            api_hash: env::var("TG_API_HASH").unwrap_or_default(),
            session_name: env::var("TG_SESSION_NAME").unwrap_or_else(|_| "session".into()),
            sources,
            thread_allowlist,
            default_target,
            target_map,
            notify_only,
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            trade: TradeDefaults {
                symbol_suffix: env::var("SYMBOL_SUFFIX").unwrap_or_else(|_| "USDT".into()),
                price_precision: env_parse("PRICE_PRECISION", 2)?,
                qty_precision: env_parse("QTY_PRECISION", 4)?,
                risk_pct: env_opt_decimal("DEFAULT_RISK_PCT", "0.01")?,
                balance: env_opt_decimal("DEFAULT_BALANCE_USDT", "1000")?,
                tp_profile: env::var("TP_PROFILE").unwrap_or_else(|_| "auto".into()),
                tp_auto_threshold_pct: env_opt_decimal("TP_AUTO_THRESHOLD_PCT", "1.2")?
                    .unwrap_or(Decimal::new(12, 1)),
                kw_scalp: env::var("TP_KEYWORD_SCALP")
                    .unwrap_or_else(|_| "scalp".into())
                    .to_lowercase(),
                kw_swing: env::var("TP_KEYWORD_SWING")
                    .unwrap_or_else(|_| "swing".into())
                    .to_lowercase(),
            },
        })
    }

    /// The configured allow-list for a chat, matched by id or handle.
    /// None means no allow-list applies to this chat.
    pub fn allowlist_for(
        &self,
        chat_id: i64,
        chat_handle: Option<&str>,
    ) -> Option<&HashSet<i64>> {
        let map = self.thread_allowlist.as_ref()?;
        if let Some(set) = map.get(&ChatRef::Id(chat_id)) {
            return Some(set);
        }
        if let Some(h) = chat_handle {
            return map.get(&ChatRef::handle(h));
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Parse helpers (pure, unit-tested)
// ---------------------------------------------------------------------------

/// Normalize the source-chat list: `SOURCE_CHATS` comma list first, single
/// `SOURCE_CHAT` as fallback; duplicates collapse on normalized form.
fn parse_sources(raw_many: Option<&str>, raw_single: Option<&str>) -> Vec<ChatRef> {
    let mut out: Vec<ChatRef> = Vec::new();
    let parts: Vec<&str> = match raw_many {
        Some(s) if !s.trim().is_empty() => s.split(',').collect(),
        _ => raw_single.into_iter().collect(),
    };
    for part in parts {
        if let Some(chat) = ChatRef::parse(part) {
            if !out.contains(&chat) {
                out.push(chat);
            }
        }
    }
    out
}

/// `TOPIC_MAP` JSON object: chat key → list of thread ids. Thread ids may
/// arrive as numbers or numeric strings; anything else is skipped.
fn parse_topic_map(raw: &str) -> anyhow::Result<HashMap<ChatRef, HashSet<i64>>> {
    let parsed: HashMap<String, Vec<serde_json::Value>> = serde_json::from_str(raw)?;
    let mut map = HashMap::new();
    for (key, ids) in parsed {
        let Some(chat) = ChatRef::parse(&key) else {
            continue;
        };
        let set: HashSet<i64> = ids.iter().filter_map(json_i64).collect();
        map.insert(chat, set);
    }
    Ok(map)
}

/// Single global `TOPIC_ID`, translated into an allow-list entry for every
/// configured source chat. Ignored when non-numeric or no sources exist.
fn parse_topic_id(
    raw: Option<&str>,
    sources: &[ChatRef],
) -> Option<HashMap<ChatRef, HashSet<i64>>> {
    let id: i64 = raw?.trim().parse().ok()?;
    if sources.is_empty() {
        return None;
    }
    Some(
        sources
            .iter()
            .map(|chat| (chat.clone(), HashSet::from([id])))
            .collect(),
    )
}

/// `TARGET_MAP` JSON object. Keys are `"chat"` or `"chat|thread-id"`, values
/// are destination chat refs. Keys with an unparsable thread part are skipped.
fn parse_target_map(raw: &str) -> anyhow::Result<HashMap<(ChatRef, Option<i64>), ChatRef>> {
    let parsed: HashMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    let mut map = HashMap::new();
    for (key, value) in parsed {
        let Some(route_key) = parse_route_key(&key) else {
            continue;
        };
        let target = match &value {
            serde_json::Value::String(s) => ChatRef::parse(s),
            serde_json::Value::Number(n) => n.as_i64().map(ChatRef::Id),
            _ => None,
        };
        if let Some(target) = target {
            map.insert(route_key, target);
        }
    }
    Ok(map)
}

/// `NOTIFY_ONLY`: a JSON list of keys, a JSON object (keys used, values
/// ignored), or a plain comma-separated string. Key shapes as in TARGET_MAP.
fn parse_notify_only(raw: &str) -> HashSet<(ChatRef, Option<i64>)> {
    let keys: Vec<String> = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Ok(serde_json::Value::Object(obj)) => obj.keys().cloned().collect(),
        _ => raw.split(',').map(str::to_string).collect(),
    };
    keys.iter()
        .filter_map(|k| parse_route_key(k.trim()))
        .collect()
}

/// Split a `"chat"` / `"chat|thread-id"` key into its parts.
fn parse_route_key(key: &str) -> Option<(ChatRef, Option<i64>)> {
    match key.split_once('|') {
        Some((chat_part, thread_part)) => {
            let chat = ChatRef::parse(chat_part)?;
            let thread: i64 = thread_part.trim().parse().ok()?;
            Some((chat, Some(thread)))
        }
        None => ChatRef::parse(key).map(|chat| (chat, None)),
    }
}

fn json_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be numeric")),
        _ => Ok(default),
    }
}

/// Decimal env value with a default; an explicitly empty value means "unset".
fn env_opt_decimal(key: &str, default: &str) -> anyhow::Result<Option<Decimal>> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Decimal::from_str(raw.trim())
            .map(Some)
            .with_context(|| format!("{key} must be a decimal number")),
        Err(_) => Ok(Some(Decimal::from_str(default).expect("default decimal"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
