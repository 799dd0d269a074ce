pub mod api;
pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod schedule;
pub mod state;
