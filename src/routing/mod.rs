pub mod router;
pub mod rules;
pub mod topic_cache;

pub use router::Router;
pub use rules::RouteTables;
pub use topic_cache::TopicCache;
