use metrics::{counter, histogram};
use std::time::Instant;

use crate::config::TradeDefaults;
use crate::models::{PlanConfig, RoutingDecision};
use crate::parsing;
use crate::planning;
use crate::services::{report, Advisor, OrderSink};
use crate::telegram::{ChatSession, InboundMessage};

/// Terminal outcome of processing one routed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Notify-only route: a short notification was sent, nothing else.
    Notified,
    /// Message forwarded, but no grammar could recover the signal fields.
    ForwardedUnparsed,
    /// Message forwarded and the full analysis report emitted.
    ForwardedReported,
}

/// Run one routed message through the processing pipeline:
/// 1. Notify-only short-circuit
/// 2. Forward the original message verbatim
/// 3. Parse (forward still stands if this fails; a short notice goes out)
/// 4. Validate, choose the allocation profile, ask the advisor
/// 5. Build the order plan, emit the report, hand the plan to the sink
pub async fn process_message(
    session: &dyn ChatSession,
    advisor: Option<&Advisor>,
    sink: &dyn OrderSink,
    trade: &TradeDefaults,
    decision: &RoutingDecision,
    msg: &InboundMessage,
) -> anyhow::Result<Outcome> {
    let start = Instant::now();
    let target = &decision.target;

    if decision.notify_only {
        let note =
            report::format_notification(&decision.source_title, decision.thread_title.as_deref());
        session.send_text(target, &note).await?;
        counter!("messages_notified_total").increment(1);
        return Ok(Outcome::Notified);
    }

    // Step 2: forward first, so the destination sees the original even when
    // everything after this point degrades.
    session.forward(msg, target).await?;

    // Step 3: parse
    let text = msg.raw_text.trim();
    let signal = match parsing::parse(text) {
        Ok(s) => s,
        Err(e) => {
            tracing::info!(
                chat_id = decision.source_chat_id,
                error = %e,
                "signal detected but not parseable"
            );
            counter!("signals_unparsed_total").increment(1);
            session
                .send_text(target, &report::format_unparsed_notice())
                .await?;
            return Ok(Outcome::ForwardedUnparsed);
        }
    };

    // Step 4: deterministic validation + profile + optional advisory
    let issues = parsing::validate(&signal);

    let profile = planning::choose_profile(
        &signal,
        &trade.tp_profile,
        trade.tp_auto_threshold_pct,
        &trade.kw_scalp,
        &trade.kw_swing,
        text,
    );
    let alloc = planning::alloc_for_signal(&signal, &profile);

    let advisory = match advisor {
        Some(a) => a.score(&signal, text).await,
        None => None,
    };

    // Step 5: plan + report
    let plan_cfg = PlanConfig {
        tp_alloc: alloc,
        risk_pct: trade.risk_pct,
        balance: trade.balance,
        price_precision: trade.price_precision,
        qty_precision: trade.qty_precision,
        use_post_only: true,
    };
    let plan = planning::build_plan(&signal, &plan_cfg, &trade.symbol_suffix);

    tracing::info!(
        chat_id = decision.source_chat_id,
        symbol = %signal.symbol,
        side = %signal.side,
        issues = issues.len(),
        profile = %profile,
        "signal processed"
    );

    let body = report::format_report(&signal, &issues, &profile, advisory.as_deref(), &plan);
    session.send_text(target, &body).await?;

    if let Ok(plan) = &plan {
        if let Err(e) = sink.submit(plan).await {
            tracing::error!(error = %e, "order sink rejected the plan");
        }
    }

    counter!("signals_processed_total").increment(1);
    histogram!("pipeline_latency_seconds").record(start.elapsed().as_secs_f64());

    Ok(Outcome::ForwardedReported)
}
