//! High score leaderboard system
//!
//! Tracks the top 10 runs. Persisted as JSON when a path is configured.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::settings::SettingsError;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Difficulty level reached
    pub level: u32,
    /// Seconds survived
    pub elapsed: f64,
    /// Seed the run was played on
    pub seed: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished run to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, level: u32, elapsed: f64, seed: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            elapsed,
            seed,
        };

        // Sorted descending by score; ties keep the earlier run first
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let mut scores: HighScores = serde_json::from_str(&json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from `path` if given; a missing or corrupt file starts fresh
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::new();
        };
        match Self::load_from(path) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(err) => {
                log::info!("No high scores at {} ({}), starting fresh", path.display(), err);
                Self::new()
            }
        }
    }

    /// Save to `path` if given, logging failures
    pub fn save(&self, path: Option<&Path>) {
        let Some(path) = path else {
            return;
        };
        match self.save_to(path) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(err) => log::warn!("Could not save high scores to {}: {}", path.display(), err),
        }
    }
}

/// Format seconds survived as `m:ss`
pub fn format_elapsed(elapsed: f64) -> String {
    let total = elapsed.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert!(scores.qualifies(10));
        assert_eq!(scores.potential_rank(10), Some(1));
    }

    #[test]
    fn test_insert_sorted_and_trimmed() {
        let mut scores = HighScores::new();
        for score in 1..=12u64 {
            scores.add_score(score * 10, 1, 30.0, score);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(120));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(30));
        assert!(!scores.qualifies(30));
        assert_eq!(scores.add_score(55, 2, 40.0, 0), Some(8));
    }

    #[test]
    fn test_ties_rank_after_existing() {
        let mut scores = HighScores::new();
        scores.add_score(100, 1, 10.0, 1);
        assert_eq!(scores.add_score(100, 1, 12.0, 2), Some(2));
        assert_eq!(scores.entries[0].seed, 1);
    }

    #[test]
    fn test_file_persistence() {
        let path = std::env::temp_dir().join(format!("endless-crossing-scores-{}.json", std::process::id()));
        let mut scores = HighScores::new();
        scores.add_score(340, 3, 95.5, 42);
        scores.save(Some(&path));
        assert_eq!(HighScores::load(Some(&path)), scores);
        std::fs::remove_file(&path).unwrap();

        // Missing file starts fresh
        assert!(HighScores::load(Some(&path)).is_empty());
        assert!(HighScores::load(None).is_empty());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0.0), "0:00");
        assert_eq!(format_elapsed(95.7), "1:35");
    }
}
