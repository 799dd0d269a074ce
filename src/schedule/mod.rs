//! Periodic tasks driving the board: feed refresh, screen rotation and the
//! redraw clock. Each runs as its own task and stops when the shutdown flag
//! flips.

pub mod refresh;
pub mod rotation;

pub use refresh::{run_refresh_cycle, spawn_refresh_task};
pub use rotation::{rotate_screen, spawn_redraw_task, spawn_rotation_task};
