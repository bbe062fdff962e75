//! Feedback panel rendering.
//!
//! Scanner nodes carry a small 4-line x 21-column character panel. This
//! module turns outcome messages into panel layouts: lines are split on
//! `\n`, truncated with a trailing ellipsis when too wide, and marked
//! for emphasis when they carry the words a person glances for
//! (`Access`, `ENTRY`, `EXIT`).
//!
//! The panel itself is behind the `FeedbackSink` hardware trait; the
//! [`VirtualPanel`] here is the software implementation used by tests
//! and the terminal frontend.
//!
//! # Examples
//!
//! ```
//! use doorlink_scanner::display::PanelLayout;
//!
//! let layout = PanelLayout::render("Access Granted\nWelcome Alice");
//!
//! assert_eq!(layout.lines.len(), 2);
//! assert!(layout.lines[0].emphasized);
//! assert!(!layout.lines[1].emphasized);
//! ```

use std::fmt;

use doorlink_core::NodeRole;
use doorlink_core::constants::{PANEL_MAX_COLUMNS, PANEL_MAX_LINES};
use doorlink_hardware::{FeedbackSink, Result as HardwareResult};

use crate::submit::{Decision, DenialReason};

/// Words that make a line render emphasized.
const EMPHASIS_KEYWORDS: [&str; 3] = ["Access", "ENTRY", "EXIT"];

/// One rendered panel line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    /// Line text, at most [`PANEL_MAX_COLUMNS`] characters.
    pub text: String,
    /// Whether the line renders in the large font.
    pub emphasized: bool,
}

/// A full panel frame, at most [`PANEL_MAX_LINES`] lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelLayout {
    pub lines: Vec<PanelLine>,
}

impl PanelLayout {
    /// Render a message into a panel frame.
    ///
    /// The message is split on `\n`; surplus lines are dropped and each
    /// kept line is fitted to the panel width.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlink_scanner::display::PanelLayout;
    ///
    /// let layout = PanelLayout::render("Access Denied\nNot Registered");
    /// assert_eq!(layout.lines[1].text, "Not Registered");
    /// ```
    #[must_use]
    pub fn render(message: &str) -> Self {
        let lines = message
            .split('\n')
            .take(PANEL_MAX_LINES)
            .map(|line| PanelLine {
                text: fit_line(line, PANEL_MAX_COLUMNS),
                emphasized: is_emphasized(line),
            })
            .collect();

        Self { lines }
    }

    /// Returns `true` when the frame has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for PanelLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Fit a line to the panel width.
///
/// Lines wider than `max` are cut to `max - 3` characters with a
/// trailing `...` so a truncated name is recognizable as truncated.
///
/// # Examples
///
/// ```
/// use doorlink_scanner::display::fit_line;
///
/// assert_eq!(fit_line("Ready for scan...", 21), "Ready for scan...");
/// assert_eq!(fit_line("Welcome Maximiliane Musterfrau", 21), "Welcome Maximilian...");
/// ```
#[must_use]
pub fn fit_line(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }

    let mut fitted: String = text.chars().take(max - 3).collect();
    fitted.push_str("...");
    fitted
}

fn is_emphasized(text: &str) -> bool {
    EMPHASIS_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Idle banner for a scanner of the given role.
#[must_use]
pub fn ready_message(role: NodeRole) -> String {
    match role {
        NodeRole::Entry => "ENTRY SCANNER\nReady for scan...".to_string(),
        NodeRole::Exit => "EXIT SCANNER\nReady for scan...".to_string(),
    }
}

/// Feedback message for a submission outcome.
///
/// Grants read differently per side: the entry scanner welcomes the
/// person in, the exit scanner confirms the door opened on the way out.
/// Classified denials show a short fixed line; an unclassified denial
/// shows the server's message as received.
#[must_use]
pub fn decision_message(role: NodeRole, decision: &Decision) -> String {
    match decision {
        Decision::Granted { user_name } => match (role, user_name) {
            (NodeRole::Entry, Some(name)) => format!("Access Granted\nWelcome {name}"),
            (NodeRole::Entry, None) => "Access Granted".to_string(),
            (NodeRole::Exit, Some(name)) => {
                format!("Access Granted\nDoor Opened\nGoodbye {name}")
            }
            (NodeRole::Exit, None) => "Access Granted\nDoor Opened".to_string(),
        },
        Decision::Denied { reason, message } => {
            let line = match reason {
                DenialReason::NotRegistered => "Not Registered",
                DenialReason::Inactive => "Card Inactive",
                DenialReason::AlreadyInside => "Already Inside",
                DenialReason::NoEntryRecord => "No Entry Found",
                DenialReason::Other => message.as_str(),
            };
            format!("Access Denied\n{line}")
        }
        Decision::Unreachable => "Access Denied\nServer Unreachable".to_string(),
    }
}

/// Software feedback panel.
///
/// Keeps the most recent frame and a changed flag so a frontend can
/// redraw only when something new arrived.
#[derive(Debug, Clone, Default)]
pub struct VirtualPanel {
    current: PanelLayout,
    changed: bool,
}

impl VirtualPanel {
    /// A blank panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent frame.
    #[must_use]
    pub fn current(&self) -> &PanelLayout {
        &self.current
    }

    /// Take the current frame if it changed since the last take.
    pub fn take_frame(&mut self) -> Option<PanelLayout> {
        if self.changed {
            self.changed = false;
            Some(self.current.clone())
        } else {
            None
        }
    }
}

impl FeedbackSink for VirtualPanel {
    async fn show(&mut self, text: &str) -> HardwareResult<()> {
        self.current = PanelLayout::render(text);
        self.changed = true;
        Ok(())
    }
}
