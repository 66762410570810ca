use async_trait::async_trait;

use crate::models::OrderIntent;

/// Consumer of a finished order plan. The real exchange client lives behind
/// this seam; submission failure modes are the sink's concern.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit(&self, plan: &[OrderIntent]) -> anyhow::Result<()>;
}

/// Reference sink: logs the plan instead of submitting it.
#[derive(Debug, Default)]
pub struct LogOrderSink;

#[async_trait]
impl OrderSink for LogOrderSink {
    async fn submit(&self, plan: &[OrderIntent]) -> anyhow::Result<()> {
        tracing::info!(orders = plan.len(), "order plan (dry run)");
        for intent in plan {
            tracing::info!("  {intent}");
        }
        Ok(())
    }
}
