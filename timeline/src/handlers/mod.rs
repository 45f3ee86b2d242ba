pub mod app;
pub mod event;
pub mod timeline;

pub use app::{router, AppState};
