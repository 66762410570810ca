pub mod advisor;
pub mod order_sink;
pub mod report;

pub use advisor::Advisor;
pub use order_sink::{LogOrderSink, OrderSink};
