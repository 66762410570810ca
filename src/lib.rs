pub mod config;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod planning;
pub mod routing;
pub mod services;
pub mod telegram;
