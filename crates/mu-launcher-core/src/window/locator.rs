//! Resolve a process ID to its primary top-level window.

use crate::config::EmbedConfig;
use crate::window::{ResolvedWindow, WindowHandle, WindowSystem};
use std::sync::Arc;
use tracing::debug;

/// Finds the window a game process presents to the user.
///
/// Windows are matched by owning process only. Titles are consulted solely
/// to exclude auxiliary windows such as debugger consoles.
#[derive(Clone)]
pub struct WindowLocator {
    windows: Arc<dyn WindowSystem>,
    auxiliary_patterns: Vec<String>,
}

impl WindowLocator {
    /// Create a locator with the default auxiliary title patterns.
    pub fn new(windows: Arc<dyn WindowSystem>) -> Self {
        Self::with_auxiliary_patterns(
            windows,
            EmbedConfig::AUXILIARY_TITLE_PATTERNS.iter().copied(),
        )
    }

    pub fn with_auxiliary_patterns<I, S>(windows: Arc<dyn WindowSystem>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let auxiliary_patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            windows,
            auxiliary_patterns,
        }
    }

    pub fn window_system(&self) -> &Arc<dyn WindowSystem> {
        &self.windows
    }

    /// Whether a title marks a window that must never be embedded.
    pub fn is_auxiliary(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.auxiliary_patterns.iter().any(|p| title.contains(p))
    }

    /// All visible, non-auxiliary top-level windows owned by `pid`, in OS
    /// enumeration order.
    pub fn candidates(&self, pid: u32) -> Vec<WindowHandle> {
        self.windows
            .top_level_windows()
            .into_iter()
            .filter(|&handle| self.windows.owner_pid(handle) == Some(pid))
            .filter(|&handle| self.windows.is_visible(handle))
            .filter(|&handle| {
                let title = self.windows.title(handle);
                if self.is_auxiliary(&title) {
                    debug!("Skipping auxiliary window {} ({:?}) of PID {}", handle, title, pid);
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Find the primary window of `pid`.
    ///
    /// Selection is a heuristic: the **first** visible, non-auxiliary window in
    /// OS enumeration order wins. Enumeration order follows z-order and is not
    /// stable across calls, so a process with several qualifying windows may
    /// resolve differently over time.
    ///
    /// Returns `None` when the process has no qualifying window.
    pub fn find_primary_window(&self, pid: u32) -> Option<ResolvedWindow> {
        let handle = self.candidates(pid).into_iter().next()?;
        debug!("Resolved PID {} to window {}", pid, handle);
        Some(ResolvedWindow { handle, pid })
    }

    /// First primary window among several processes, in the order given.
    pub fn find_for_any_pid(&self, pids: &[u32]) -> Option<ResolvedWindow> {
        pids.iter().find_map(|&pid| self.find_primary_window(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimWindowSystem;

    fn locator(sim: &Arc<SimWindowSystem>) -> WindowLocator {
        WindowLocator::new(sim.clone())
    }

    #[test]
    fn test_returns_none_without_windows() {
        let sim = Arc::new(SimWindowSystem::new());
        assert!(locator(&sim).find_primary_window(42).is_none());
    }

    #[test]
    fn test_matches_by_owner_not_title() {
        let sim = Arc::new(SimWindowSystem::new());
        sim.add_window(7, "MU");
        let game = sim.add_window(42, "Some Other Title");

        let found = locator(&sim).find_primary_window(42).unwrap();
        assert_eq!(found.handle, game);
        assert_eq!(found.pid, 42);
    }

    #[test]
    fn test_first_candidate_in_enumeration_order_wins() {
        let sim = Arc::new(SimWindowSystem::new());
        let first = sim.add_window(42, "MU");
        let _second = sim.add_window(42, "MU Launcher Helper");

        assert_eq!(locator(&sim).candidates(42).len(), 2);
        assert_eq!(locator(&sim).find_primary_window(42).unwrap().handle, first);
    }

    #[test]
    fn test_skips_auxiliary_and_hidden_windows() {
        let sim = Arc::new(SimWindowSystem::new());
        sim.add_window(42, "Game DEBUGGER console");
        let hidden = sim.add_window(42, "MU");
        sim.set_visible(hidden, false);
        let game = sim.add_window(42, "MU");

        assert_eq!(locator(&sim).find_primary_window(42).unwrap().handle, game);
    }

    #[test]
    fn test_custom_patterns_are_case_insensitive() {
        let sim = Arc::new(SimWindowSystem::new());
        let locator = WindowLocator::with_auxiliary_patterns(sim, ["Console", ""]);
        assert!(locator.is_auxiliary("debug CONSOLE"));
        assert!(!locator.is_auxiliary("MU"));
    }

    #[test]
    fn test_find_for_any_pid_respects_order() {
        let sim = Arc::new(SimWindowSystem::new());
        let second = sim.add_window(2, "MU");
        let first = sim.add_window(1, "MU");

        let locator = locator(&sim);
        assert_eq!(locator.find_for_any_pid(&[1, 2]).unwrap().handle, first);
        assert_eq!(locator.find_for_any_pid(&[3, 2]).unwrap().handle, second);
        assert!(locator.find_for_any_pid(&[3]).is_none());
    }
}
