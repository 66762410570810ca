use crate::models::{OrderIntent, TradeSignal};
use crate::planning::PlanError;

/// Short notification for notify-only routes.
pub fn format_notification(chat_title: &str, thread_title: Option<&str>) -> String {
    match thread_title {
        Some(t) => format!("🔔 New message detected in {chat_title} | topic: {t}."),
        None => format!("🔔 New message detected in {chat_title}."),
    }
}

/// Sent after the forward when the signal text resisted every grammar.
pub fn format_unparsed_notice() -> String {
    "⚠️ Signal detected, but the fields could not be interpreted (unsupported format).".into()
}

/// One-line error message for the router's outer boundary.
pub fn format_processing_error(err: &anyhow::Error) -> String {
    format!("⚠️ Failed to process message: {err}")
}

/// The analysis report sent as a second message after the forward.
pub fn format_report(
    signal: &TradeSignal,
    issues: &[String],
    profile: &str,
    advisory: Option<&str>,
    plan: &Result<Vec<OrderIntent>, PlanError>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if issues.is_empty() {
        parts.push("✅ *Local validation OK.*".into());
    } else {
        parts.push(format!(
            "⚠️ *Local validation found problems:*\n- {}",
            issues.join("\n- ")
        ));
    }

    if let Some(note) = advisory {
        parts.push(format!("🤖 *Advisor:* {note}"));
    }

    parts.push(format!("📌 *Profile:* {profile}"));
    parts.push(format!("📊 *Parsed signal:*\n`{signal}`"));

    match plan {
        Ok(orders) => {
            let rows: Vec<String> = orders.iter().map(|o| o.to_string()).collect();
            parts.push(format!("🧾 *Order plan (dry):*\n```\n{}\n```", rows.join("\n")));
        }
        Err(e) => {
            parts.push(format!("🧾 *Order plan:* not built — {e}"));
        }
    }

    parts.join("\n\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
