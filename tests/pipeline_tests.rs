mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

use common::{signal_message, test_config, FakeSession};
use sigrelay::models::{ChatRef, OrderIntent, RoutingDecision};
use sigrelay::pipeline::{process_message, Outcome};
use sigrelay::services::OrderSink;
use sigrelay::telegram::InboundMessage;

/// Records every submitted plan.
#[derive(Default)]
struct RecordingSink {
    plans: Mutex<Vec<Vec<OrderIntent>>>,
}

#[async_trait]
impl OrderSink for RecordingSink {
    async fn submit(&self, plan: &[OrderIntent]) -> anyhow::Result<()> {
        self.plans.lock().unwrap().push(plan.to_vec());
        Ok(())
    }
}

fn decision(notify_only: bool) -> RoutingDecision {
    RoutingDecision {
        source_chat_id: -100,
        source_handle: None,
        source_title: "Test Group".into(),
        thread_root: Some(400),
        thread_id: Some(4),
        thread_title: Some("signals".into()),
        target: ChatRef::Id(999),
        notify_only,
    }
}

#[tokio::test]
async fn test_full_flow_forwards_reports_and_submits_plan() {
    let session = Arc::new(FakeSession::default());
    let sink = RecordingSink::default();
    let mut config = test_config(vec![ChatRef::Id(-100)]);
    config.trade.balance = Some(Decimal::from_str("1000").unwrap());
    config.trade.risk_pct = Some(Decimal::from_str("0.01").unwrap());

    let msg = signal_message(-100, 10, Some(400));
    let outcome = process_message(
        session.as_ref(),
        None,
        &sink,
        &config.trade,
        &decision(false),
        &msg,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::ForwardedReported);
    assert_eq!(session.forwarded(), vec![(10, ChatRef::Id(999))]);

    let plans = sink.plans.lock().unwrap();
    assert_eq!(plans.len(), 1);
    // ENTRY + 2 TPs + SL, sized off 1000 * 0.01 / |9 - 11|
    assert_eq!(plans[0].len(), 4);
    assert_eq!(plans[0][0].qty, Decimal::from_str("5").unwrap());
}

#[tokio::test]
async fn test_notify_only_short_circuits() {
    let session = Arc::new(FakeSession::default());
    let sink = RecordingSink::default();
    let config = test_config(vec![ChatRef::Id(-100)]);

    let msg = signal_message(-100, 10, Some(400));
    let outcome = process_message(
        session.as_ref(),
        None,
        &sink,
        &config.trade,
        &decision(true),
        &msg,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Notified);
    assert!(session.forwarded().is_empty());
    assert!(sink.plans.lock().unwrap().is_empty());
    let sends = session.sent_texts();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].1.contains("Test Group"));
    assert!(sends[0].1.contains("signals"));
}

#[tokio::test]
async fn test_unparseable_text_forwards_then_notices() {
    let session = Arc::new(FakeSession::default());
    let sink = RecordingSink::default();
    let config = test_config(vec![ChatRef::Id(-100)]);

    let msg = InboundMessage::new(-100, 10, "LONG vibes only, sl soon");
    let outcome = process_message(
        session.as_ref(),
        None,
        &sink,
        &config.trade,
        &decision(false),
        &msg,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::ForwardedUnparsed);
    assert_eq!(session.forwarded().len(), 1);
    assert!(session.sent_texts()[0].1.contains("could not be interpreted"));
    assert!(sink.plans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_issues_reach_the_report() {
    let session = Arc::new(FakeSession::default());
    let sink = RecordingSink::default();
    let config = test_config(vec![ChatRef::Id(-100)]);

    // LONG with the stop above the entry PM
    let msg = InboundMessage::new(-100, 10, "LONG $ETH\nEntrada: 10 - 12\nSL: 13\nTPs: 14");
    let outcome = process_message(
        session.as_ref(),
        None,
        &sink,
        &config.trade,
        &decision(false),
        &msg,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::ForwardedReported);
    let sends = session.sent_texts();
    assert!(sends[0].1.contains("found problems"));
    assert!(sends[0].1.contains("stop-loss"));
}
