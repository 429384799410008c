//! Style and parent mutation for embedding a foreign window.
//!
//! Every step is attempted best-effort and recorded in an [`EmbedReport`], so
//! a partially successful embed can be diagnosed from one log line.

use crate::window::{WindowHandle, WindowStyle, WindowSystem};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a single embedding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "error")]
pub enum StepOutcome {
    Applied,
    Failed(String),
    /// Not attempted because an earlier step it depends on failed.
    Skipped,
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }

    fn from_result(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => StepOutcome::Applied,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Applied => write!(f, "ok"),
            StepOutcome::Failed(e) => write!(f, "failed ({})", e),
            StepOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-step record of one `embed` call.
///
/// # Aggregate
///
/// [`EmbedReport::success`] is false only when the precondition (both handles
/// valid) or the reparent step failed. Style and resize failures are recorded
/// but leave a reparented window usable, so they do not fail the embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedReport {
    pub game: WindowHandle,
    pub host: WindowHandle,
    pub precondition: StepOutcome,
    pub read_style: StepOutcome,
    pub write_style: StepOutcome,
    pub reparent: StepOutcome,
    pub resize: StepOutcome,
    #[serde(skip)]
    pub style_before: Option<WindowStyle>,
    #[serde(skip)]
    pub style_after: Option<WindowStyle>,
}

impl EmbedReport {
    fn new(game: WindowHandle, host: WindowHandle) -> Self {
        Self {
            game,
            host,
            precondition: StepOutcome::Skipped,
            read_style: StepOutcome::Skipped,
            write_style: StepOutcome::Skipped,
            reparent: StepOutcome::Skipped,
            resize: StepOutcome::Skipped,
            style_before: None,
            style_after: None,
        }
    }

    pub fn success(&self) -> bool {
        self.precondition.is_applied() && self.reparent.is_applied()
    }

    /// First failure message, for user-facing summaries.
    pub fn first_failure(&self) -> Option<String> {
        [
            ("precondition", &self.precondition),
            ("read style", &self.read_style),
            ("write style", &self.write_style),
            ("reparent", &self.reparent),
            ("resize", &self.resize),
        ]
        .into_iter()
        .find_map(|(step, outcome)| match outcome {
            StepOutcome::Failed(e) => Some(format!("{}: {}", step, e)),
            _ => None,
        })
    }
}

impl fmt::Display for EmbedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "embed {} into {}: precondition {}, read style {}, write style {}, reparent {}, resize {}",
            self.game,
            self.host,
            self.precondition,
            self.read_style,
            self.write_style,
            self.reparent,
            self.resize
        )
    }
}

/// Applies and reverts embedding on native windows.
#[derive(Clone)]
pub struct EmbeddingEngine {
    windows: Arc<dyn WindowSystem>,
}

impl EmbeddingEngine {
    pub fn new(windows: Arc<dyn WindowSystem>) -> Self {
        Self { windows }
    }

    pub fn window_system(&self) -> &Arc<dyn WindowSystem> {
        &self.windows
    }

    /// Embed `game` into `host` at (0, 0, width, height).
    ///
    /// Steps run in order: read style, write the embedded style, reparent,
    /// resize. A failed style read skips the style write; every other failure
    /// is recorded and the next step still runs. Calling this on an already
    /// embedded window leaves style and parent unchanged.
    pub fn embed(&self, game: WindowHandle, host: WindowHandle, width: u32, height: u32) -> EmbedReport {
        let mut report = EmbedReport::new(game, host);

        if !self.windows.is_window(game) || !self.windows.is_window(host) {
            report.precondition = StepOutcome::Failed(format!(
                "invalid handle (game {} valid: {}, host {} valid: {})",
                game,
                self.windows.is_window(game),
                host,
                self.windows.is_window(host)
            ));
            warn!("{}", report);
            return report;
        }
        report.precondition = StepOutcome::Applied;

        match self.windows.style(game) {
            Ok(style) => {
                report.read_style = StepOutcome::Applied;
                report.style_before = Some(style);

                let target = style.embedded();
                report.write_style = if target == style {
                    StepOutcome::Applied
                } else {
                    StepOutcome::from_result(self.windows.set_style(game, target))
                };
                if report.write_style.is_applied() {
                    report.style_after = Some(target);
                } else {
                    warn!(
                        "Failed to set style {} on {} (was {}): {}",
                        target, game, style, report.write_style
                    );
                }
            }
            Err(e) => {
                warn!("Failed to read style of {}: {}", game, e);
                report.read_style = StepOutcome::Failed(e.to_string());
            }
        }

        report.reparent = if self.windows.parent(game) == Some(host) {
            StepOutcome::Applied
        } else {
            StepOutcome::from_result(self.windows.set_parent(game, Some(host)))
        };
        if !report.reparent.is_applied() {
            warn!("Failed to reparent {} into {}: {}", game, host, report.reparent);
        }

        report.resize = StepOutcome::from_result(self.windows.place(game, 0, 0, width, height));
        if !report.resize.is_applied() {
            warn!("Failed to resize {} to {}x{}: {}", game, width, height, report.resize);
        }

        if report.success() {
            info!("Embedded window {} into {} at {}x{}", game, host, width, height);
        }
        debug!("{}", report);
        report
    }

    /// Resize an embedded window without touching style or parent.
    pub fn resize(&self, game: WindowHandle, width: u32, height: u32) -> bool {
        match self.windows.place(game, 0, 0, width, height) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to resize {} to {}x{}: {}", game, width, height, e);
                false
            }
        }
    }

    /// Release `game` back to the desktop as a normal top-level window.
    ///
    /// Best-effort: the parent is cleared, `original_style` (minus the child
    /// bit) is restored and the window is shown. Returns whether every step
    /// succeeded.
    pub fn undock(&self, game: WindowHandle, original_style: Option<WindowStyle>) -> bool {
        if !self.windows.is_window(game) {
            debug!("Skipping undock of destroyed window {}", game);
            return false;
        }

        let mut ok = true;
        if let Err(e) = self.windows.set_parent(game, None) {
            warn!("Undock: failed to clear parent of {}: {}", game, e);
            ok = false;
        }

        let restored = match original_style {
            Some(style) => style.detached(),
            None => match self.windows.style(game) {
                Ok(current) => WindowStyle(
                    current.detached().bits() | WindowStyle::CAPTION | WindowStyle::THICKFRAME,
                ),
                Err(e) => {
                    warn!("Undock: failed to read style of {}: {}", game, e);
                    return false;
                }
            },
        };
        if let Err(e) = self.windows.set_style(game, restored) {
            warn!("Undock: failed to restore style {} on {}: {}", restored, game, e);
            ok = false;
        }
        if let Err(e) = self.windows.refresh_frame(game) {
            warn!("Undock: failed to show {}: {}", game, e);
            ok = false;
        }

        info!("Undocked window {} (complete: {})", game, ok);
        ok
    }
}
