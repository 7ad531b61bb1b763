//! Local leaderboard
//!
//! Persisted to LocalStorage, keeps the 50 best submitted runs. Once full,
//! rows from past weeks give way so the weekly view keeps filling.

use serde::{Deserialize, Serialize};

/// Maximum number of rows to keep
pub const MAX_ROWS: usize = 50;
/// Rows shown per view
pub const VIEW_ROWS: usize = 20;
/// Longest name stored
const MAX_NAME_CHARS: usize = 24;
const ANONYMOUS: &str = "@anon";

/// A single submitted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub name: String,
    pub score: u64,
    /// ISO week the run was submitted in
    pub week_key: String,
    /// Unix timestamp (ms) of submission
    pub timestamp: f64,
}

/// Which slice of the leaderboard to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaderboardView {
    #[default]
    Weekly,
    AllTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    /// Sorted descending by score
    pub rows: Vec<LeaderboardRow>,
}

fn clean_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
    if trimmed.is_empty() {
        ANONYMOUS.to_string()
    } else {
        trimmed
    }
}

impl Leaderboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "rekt_runner_leaderboard";

    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Check if a score submitted in `week_key` would be kept
    pub fn qualifies(&self, score: u64, week_key: &str) -> bool {
        if score == 0 {
            return false;
        }
        self.rows.len() < MAX_ROWS
            || self.beats_lowest(score)
            || self.stale_row(week_key).is_some()
    }

    fn beats_lowest(&self, score: u64) -> bool {
        self.rows.last().map(|r| score > r.score).unwrap_or(true)
    }

    /// Lowest row from another week; makes room for the current week
    /// once the table is full
    fn stale_row(&self, week_key: &str) -> Option<usize> {
        self.rows.iter().rposition(|r| r.week_key != week_key)
    }

    /// Submit a run. Returns the all-time rank achieved (1-indexed) or None
    /// if the score did not make the table.
    pub fn submit(&mut self, name: &str, score: u64, week_key: &str, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score, week_key) {
            return None;
        }

        if self.rows.len() >= MAX_ROWS && !self.beats_lowest(score) {
            if let Some(i) = self.stale_row(week_key) {
                let evicted = self.rows.remove(i);
                log::debug!("Evicted {} from {} to make room", evicted.score, evicted.week_key);
            }
        }

        let row = LeaderboardRow {
            name: clean_name(name),
            score,
            week_key: week_key.to_string(),
            timestamp,
        };

        // Ties keep submission order
        let pos = self.rows.iter().position(|r| score > r.score);
        let rank = match pos {
            Some(i) => {
                self.rows.insert(i, row);
                i + 1
            }
            None => {
                self.rows.push(row);
                self.rows.len()
            }
        };

        self.rows.truncate(MAX_ROWS);
        Some(rank)
    }

    /// Top rows for a view, highest first
    pub fn view(&self, view: LeaderboardView, current_week: &str) -> Vec<&LeaderboardRow> {
        self.rows
            .iter()
            .filter(|r| match view {
                LeaderboardView::Weekly => r.week_key == current_week,
                LeaderboardView::AllTime => true,
            })
            .take(VIEW_ROWS)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.rows.first().map(|r| r.score)
    }

    /// Restore ordering and size after loading untrusted data
    fn normalized(mut self) -> Self {
        self.rows.sort_by(|a, b| b.score.cmp(&a.score));
        self.rows.truncate(MAX_ROWS);
        self
    }

    /// Load the leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(board) = serde_json::from_str::<Leaderboard>(&json) {
                    log::info!("Loaded {} leaderboard rows", board.rows.len());
                    return board.normalized();
                }
            }
        }

        log::info!("No leaderboard found, starting fresh");
        Self::new()
    }

    /// Save the leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Leaderboard saved ({} rows)", self.rows.len());
            }
        }
    }

    /// Wipe the stored leaderboard (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn clear_storage() {
        if let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        {
            let _ = storage.remove_item(Self::STORAGE_KEY);
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new().normalized()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn clear_storage() {}
}

/// Whole points with thousands separators, e.g. `12,345`
pub fn format_score(score: f64) -> String {
    let digits = crate::profile::whole_score(score).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
