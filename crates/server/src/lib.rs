pub mod bridge;
pub mod server;

pub use server::{router, AppState, OrganizeRequest, SourceType, DEFAULT_MAX_JOBS};
