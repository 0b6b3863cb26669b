//! Gateway server for the Mistmap fog-of-war system.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Controller `WebSocket`** (`/ws/controller`) -- the authenticated,
//!   bidirectional channel a moderator uses to mutate world state.
//!   Receives full documents and the live viewer counter.
//! - **Viewer `WebSocket`** (`/ws/viewer`) -- the unauthenticated,
//!   receive-only channel map displays subscribe to. Receives derived
//!   projections only, via [`tokio::sync::broadcast`] fan-out.
//! - **Static images** (`GET /images/{*path}`) served from the active
//!   world's image root behind a path-containment check.
//! - **Minimal HTML status page** (`GET /`) showing the active world,
//!   region, and viewer count.
//!
//! # Architecture
//!
//! All mutations funnel through [`commands`], which re-authenticates
//! every request, applies it to the shared [`mistmap_world::WorldState`]
//! under the write lock, persists through the document store, and only
//! then pushes broadcasts -- one mutation is fully applied and announced
//! before the next begins. Viewer joins read the same state under the
//! shared lock, so a late joiner always sees exactly what the most
//! recent broadcast delivered.

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod session;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use auth::AuthGuard;
pub use config::AppConfig;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use session::{SessionRegistry, SessionSnapshot};
pub use state::AppState;
