//! Gold Rush Arena - real-time 2D arena simulation
//!
//! The `game` module is a headless, tick-driven simulation core: actors with
//! cooldown-gated skills, bots, a contested gold coin and projectiles. The
//! remaining modules host it over WebSocket:
//! - `ws` for per-session matches (key events in, snapshots out)
//! - `http` for the router and health endpoint
//! - `config`, `app` and `util` for the ambient plumbing

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
