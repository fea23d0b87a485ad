// Library exports for the snake agent
// The protocol driver, the replay tool and the integration tests all use the
// engine through this crate.

pub mod board;
pub mod bot;
pub mod config;
pub mod context;
pub mod debug_logger;
pub mod pathfinding;
pub mod protocol;
pub mod replay;
pub mod scoring;
pub mod simple_profiler;
pub mod space;
pub mod threat;
pub mod tour;
pub mod types;
