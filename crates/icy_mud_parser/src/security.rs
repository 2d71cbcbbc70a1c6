//! Per line MXP trust state.

use std::fmt::Display;

/// MXP line type as selected by `ESC[<n>z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineType(pub u8);

impl LineType {
    pub const OPEN: LineType = LineType(0);
    pub const SECURE: LineType = LineType(1);
    pub const LOCKED: LineType = LineType(2);
    pub const RESET: LineType = LineType(3);
    pub const TEMP_SECURE: LineType = LineType(4);
    pub const LOCK_OPEN: LineType = LineType(5);
    pub const LOCK_SECURE: LineType = LineType(6);
    pub const LOCK_LOCKED: LineType = LineType(7);
    pub const ROOM_NAME: LineType = LineType(10);
    pub const ROOM_DESCRIPTION: LineType = LineType(11);
    pub const ROOM_EXITS: LineType = LineType(12);
    pub const WELCOME_TEXT: LineType = LineType(19);

    /// Secure, LockSecure and TempSecure allow tags with side effects.
    pub fn is_secure(&self) -> bool {
        matches!(*self, LineType::SECURE | LineType::LOCK_SECURE | LineType::TEMP_SECURE)
    }

    /// Locked lines do not interpret markup at all.
    pub fn is_locked(&self) -> bool {
        matches!(*self, LineType::LOCKED | LineType::LOCK_LOCKED)
    }
}

impl Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            LineType::OPEN => write!(f, "open"),
            LineType::SECURE => write!(f, "secure"),
            LineType::LOCKED => write!(f, "locked"),
            LineType::RESET => write!(f, "reset"),
            LineType::TEMP_SECURE => write!(f, "temp secure"),
            LineType::LOCK_OPEN => write!(f, "lock open"),
            LineType::LOCK_SECURE => write!(f, "lock secure"),
            LineType::LOCK_LOCKED => write!(f, "lock locked"),
            LineType::ROOM_NAME => write!(f, "room name"),
            LineType::ROOM_DESCRIPTION => write!(f, "room description"),
            LineType::ROOM_EXITS => write!(f, "room exits"),
            LineType::WELCOME_TEXT => write!(f, "welcome text"),
            LineType(n) => write!(f, "tag {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineSecurity {
    /// Markup is interpreted on the current line.
    pub on: bool,
    pub line_type: LineType,
    /// Mode the next line falls back to, pinned by the lock modes.
    pub default_mode: LineType,
    /// A lock mode is active; newlines keep the current mode.
    pub locked: bool,
    /// Inside `<P>`: newlines are ignored.
    pub paragraph: bool,
    /// `<NOBR>`: the next newline is ignored.
    pub no_break: bool,
    /// The closing markup of the current line tag was already spliced in.
    pub line_expanded: bool,
    /// `ESC[4z` was seen and the next character must open a tag.
    pub temp_secure_pending: bool,
    captures: Vec<String>,
}

impl LineSecurity {
    pub fn reset(&mut self) {
        *self = LineSecurity::default();
    }

    pub fn is_secure(&self) -> bool {
        self.line_type.is_secure()
    }

    /// Markup is interpreted right now.
    pub fn active(&self) -> bool {
        self.on && !self.line_type.is_locked()
    }

    pub fn capture_depth(&self) -> usize {
        self.captures.len()
    }

    pub fn push_capture(&mut self) {
        self.captures.push(String::new());
    }

    pub fn pop_capture(&mut self) -> Option<String> {
        self.captures.pop()
    }

    /// Appends visible output to every open capture.
    pub fn capture(&mut self, text: &str) {
        for buffer in &mut self.captures {
            buffer.push_str(text);
        }
    }

    /// Removes the last captured character, used by backspace.
    pub fn uncapture(&mut self) {
        for buffer in &mut self.captures {
            buffer.pop();
        }
    }
}
