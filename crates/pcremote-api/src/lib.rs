//! HTTP client for the pcremote backend and the store trait the sync component consumes.

mod client;
mod store;

pub use client::ApiClient;
pub use store::PendingActionStore;
