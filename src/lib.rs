//! Rekt Runner - a chart-themed endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, physics, spawning, scoring)
//! - `tuning`: Data-driven game balance
//! - `profile`: Credits, characters, shop and daily streak
//! - `leaderboard`: Local best-runs table
//! - `renderer`: Canvas 2D projection
//! - `ui`: HUD and toast text

pub mod leaderboard;
pub mod profile;
pub mod renderer;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use leaderboard::{Leaderboard, LeaderboardView};
pub use profile::{CharacterId, ProfileError, SaveRecord, ShopItem};
pub use sim::{GameEvent, HudSnapshot, RunModifiers, RunStatus, Simulation};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Logical canvas size; matches the default view
    pub const CANVAS_WIDTH: u32 = 420;
    pub const CANVAS_HEIGHT: u32 = 740;

    /// Frame step used when no browser clock is available
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// How long a toast stays on screen
    pub const TOAST_MS: i32 = 1800;
}
