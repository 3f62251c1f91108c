//! Web console.
//!
//! Server-rendered pages for bots, their configuration and knowledge base,
//! and bot users; the `/api` JSON surface; and a WebSocket that pushes
//! notices and ingestion updates.

pub mod extract;
pub mod rest;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;
pub mod websocket;

pub use server::{build_router, start_dashboard};
pub use state::{ConsoleEvent, DashboardState, Notice, NoticeLevel};
