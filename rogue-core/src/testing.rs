//! Testing utilities for the dungeon engine.
//!
//! This module provides tools for deterministic tests:
//! - `MockCompletion` returns scripted text instead of calling Claude
//! - Grid builders for hand-made maps
//! - Assertion helpers for dungeon invariants

use crate::completion::{CompletionError, TextCompletion};
use crate::dungeon::{is_reachable, DungeonGrid, Position, Tile};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A completion source that returns scripted responses in order.
///
/// Once the script runs out (or when built with [`MockCompletion::failing`])
/// every call fails with `CompletionError::Unavailable`.
#[derive(Debug, Default)]
pub struct MockCompletion {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletion {
    /// Create a mock with scripted responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Add a response to the end of the script.
    pub fn queue_response(&self, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response.into());
        }
    }

    /// Number of calls made so far, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self.responses.lock().ok().and_then(|mut r| r.pop_front());
        next.ok_or_else(|| CompletionError::Unavailable("no scripted response".to_string()))
    }
}

/// Build a grid from ASCII rows: `#` wall, `.` floor, `>` exit.
///
/// Rows are read top to bottom, so `rows[y]` holds the cells of row `y`.
pub fn grid_from_ascii(rows: &[&str]) -> DungeonGrid {
    let height = rows.len() as i32;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
    let mut grid = DungeonGrid::new(width, height);

    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            let pos = Position::new(x as i32, y as i32);
            match c {
                '.' => grid.set_tile(pos, Tile::Floor),
                '>' => grid.set_exit(pos),
                _ => {}
            }
        }
    }
    grid
}

/// Assert that the exit of a grid can be reached from its entry.
#[track_caller]
pub fn assert_exit_reachable(grid: &DungeonGrid) {
    let (Some(entry), Some(exit)) = (grid.entry(), grid.exit()) else {
        panic!("Expected a grid with an entry and an exit");
    };
    assert!(
        is_reachable(grid, entry, exit),
        "Expected exit {exit} to be reachable from entry {entry}"
    );
}

/// Assert that no walkable cell lies outside the grid bounds.
#[track_caller]
pub fn assert_bounds_closed(grid: &DungeonGrid) {
    for x in -2..grid.width() + 2 {
        for y in -2..grid.height() + 2 {
            let inside = x >= 0 && x < grid.width() && y >= 0 && y < grid.height();
            if !inside {
                assert!(
                    !grid.is_walkable(Position::new(x, y)),
                    "Out-of-bounds ({x}, {y}) reported walkable"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_script_in_order() {
        let mock = MockCompletion::new(vec!["one".to_string(), "two".to_string()]);

        assert_eq!(mock.complete("a").await.unwrap(), "one");
        assert_eq!(mock.complete("b").await.unwrap(), "two");
        assert!(mock.complete("c").await.is_err());
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_queue_response() {
        let mock = MockCompletion::failing();
        assert!(mock.complete("x").await.is_err());

        mock.queue_response("late");
        assert_eq!(mock.complete("y").await.unwrap(), "late");
    }

    #[test]
    fn test_grid_from_ascii() {
        let grid = grid_from_ascii(&["#####", "#..>#", "#####"]);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.tile(Position::new(1, 1)), Some(Tile::Floor));
        assert_eq!(grid.exit(), Some(Position::new(3, 1)));
        assert!(grid.is_exit(Position::new(3, 1)));
        assert_bounds_closed(&grid);
    }
}
