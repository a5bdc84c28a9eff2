//! Agri API - HTTP/WebSocket Boundary
//!
//! Terminates client connections for the telemetry gateway: the ingest
//! endpoint, the query endpoints over the repository's read-only handle,
//! and the two WebSocket streams (`/ws/telemetry` for accepted packets,
//! `/ws/alerts` for rejections). Fan-out to stream subscribers goes
//! through an event broadcaster so no registry lock is ever held across
//! network I/O.

pub mod broadcast;
pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use broadcast::EventBroadcaster;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{run_server, ApiConfig};
pub use state::AppState;
