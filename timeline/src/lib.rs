pub mod api;
pub mod config;
pub mod event;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod store;
