//! On-screen messages and the mission info window.

use std::collections::VecDeque;

use crate::math::Vec3;

const MAX_MESSAGES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Info,
    Warning,
    Error,
    /// Message from the mission script
    Message,
}

/// Fixed notices raised by the runtime itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Win,
    Lost,
    BeginSatCom,
    WriteOk,
    ErrCmd,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Win => "<<< Well done; mission accomplished >>>",
            Notice::Lost => "<<< Sorry; mission failed >>>",
            Notice::BeginSatCom => "Press \\key help; to read instructions on your SatCom",
            Notice::WriteOk => "Saved successfully",
            Notice::ErrCmd => "Unknown command",
        }
    }

    pub fn kind(&self) -> TextKind {
        match self {
            Notice::Lost | Notice::ErrCmd => TextKind::Error,
            Notice::BeginSatCom => TextKind::Info,
            _ => TextKind::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub text: String,
    pub kind: TextKind,
    /// Location a visit can fly to
    pub goal: Option<Vec3>,
    pub age: f32,
}

#[derive(Debug)]
pub struct DisplayText {
    messages: VecDeque<DisplayMessage>,
    enabled: bool,
    hidden: bool,
    /// Seconds a message stays on screen
    pub delay: f32,
    info_file: Option<String>,
}

impl Default for DisplayText {
    fn default() -> Self {
        Self {
            messages: VecDeque::new(),
            enabled: true,
            hidden: false,
            delay: 10.0,
            info_file: None,
        }
    }
}

impl DisplayText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `text` unless display is disabled. Returns whether it was shown.
    pub fn display_text(&mut self, text: &str, kind: TextKind) -> bool {
        self.push(text, kind, None)
    }

    pub fn display_goal(&mut self, text: &str, kind: TextKind, goal: Vec3) -> bool {
        self.push(text, kind, Some(goal))
    }

    pub fn display_notice(&mut self, notice: Notice) -> bool {
        self.push(notice.text(), notice.kind(), None)
    }

    fn push(&mut self, text: &str, kind: TextKind, goal: Option<Vec3>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(DisplayMessage {
            text: text.to_string(),
            kind,
            goal,
            age: 0.0,
        });
        true
    }

    pub fn messages(&self) -> impl Iterator<Item = &DisplayMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&DisplayMessage> {
        self.messages.back()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.text == text)
    }

    /// Goal of the most recent message that has one
    pub fn last_goal(&self) -> Option<Vec3> {
        self.messages.iter().rev().find_map(|m| m.goal)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn set_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_hide(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn frame(&mut self, rel_time: f32) {
        for m in &mut self.messages {
            m.age += rel_time;
        }
        let delay = self.delay;
        self.messages.retain(|m| m.age < delay);
    }

    // ========================================================================
    // INFO WINDOW
    // ========================================================================

    pub fn start_display_info(&mut self, file: &str) {
        self.info_file = Some(file.to_string());
    }

    pub fn stop_display_info(&mut self) {
        self.info_file = None;
    }

    pub fn info_file(&self) -> Option<&str> {
        self.info_file.as_deref()
    }

    /// Closes the info window and forgets every message
    pub fn flush(&mut self) {
        self.info_file = None;
        self.messages.clear();
        self.enabled = true;
        self.hidden = false;
    }
}
