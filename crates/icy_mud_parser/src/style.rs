//! Nested MXP style frames.

use crate::{FontStyle, LinkFormat, Rgb, mxp::MxpTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTag {
    /// Bottom frame, never popped.
    Sentinel,
    Builtin(MxpTag),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FramePayload {
    #[default]
    None,
    /// `<A>` target.
    Link(LinkFormat),
    /// `<SEND>` target.
    Send(LinkFormat),
    /// `<VAR>` arguments, applied when the capture is closed.
    Var(Vec<String>),
}

/// One level of MXP styling. Frames are cloned from the frame below, so the
/// top frame always holds the effective overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleFrame {
    pub tag: FrameTag,
    pub font: Option<String>,
    pub size: Option<String>,
    pub style: FontStyle,
    pub fore: Option<Rgb>,
    pub back: Option<Rgb>,
    pub high: bool,
    /// Opened by an open (non secure) tag; such frames are dropped at end of line.
    pub open: bool,
    pub payload: FramePayload,
}

impl Default for StyleFrame {
    fn default() -> Self {
        Self {
            tag: FrameTag::Sentinel,
            font: None,
            size: None,
            style: FontStyle::empty(),
            fore: None,
            back: None,
            high: false,
            open: false,
            payload: FramePayload::None,
        }
    }
}

impl StyleFrame {
    pub fn is_link(&self) -> bool {
        matches!(self.payload, FramePayload::Link(_) | FramePayload::Send(_))
    }
}

/// Result of closing a tag.
#[derive(Debug, Default)]
pub struct ClosedFrames {
    /// The frame the close tag matched, if any.
    pub matched: Option<StyleFrame>,
    /// Frames above the match that were closed implicitly, top first.
    pub implicit: Vec<StyleFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleStack {
    frames: Vec<StyleFrame>,
}

impl Default for StyleStack {
    fn default() -> Self {
        Self {
            frames: vec![StyleFrame::default()],
        }
    }
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> &StyleFrame {
        // the sentinel is never removed
        &self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn frames(&self) -> &[StyleFrame] {
        &self.frames
    }

    /// Copy of the top frame to be modified and pushed for `tag`.
    pub fn derive(&self, tag: FrameTag, open: bool) -> StyleFrame {
        let mut frame = self.top().clone();
        frame.tag = tag;
        frame.open = open;
        frame.payload = FramePayload::None;
        frame
    }

    pub fn push(&mut self, frame: StyleFrame) {
        self.frames.push(frame);
    }

    pub fn payload_mut(&mut self) -> impl Iterator<Item = &mut FramePayload> {
        self.frames.iter_mut().skip(1).map(|f| &mut f.payload)
    }

    /// Pops back to the topmost frame opened by `tag`.
    ///
    /// On a non secure line frames opened by secure tags are left alone. An
    /// unmatched close collapses the stack to the sentinel.
    pub fn close(&mut self, tag: &FrameTag, secure: bool) -> ClosedFrames {
        let position = self.frames.iter().enumerate().skip(1).rev().find(|(_, f)| &f.tag == tag && (secure || f.open)).map(|(i, _)| i);
        let mut result = ClosedFrames::default();
        let from = position.unwrap_or(1);
        let mut kept = Vec::new();
        while self.frames.len() > from {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            if self.frames.len() == from && position.is_some() {
                result.matched = Some(frame);
            } else if secure || frame.open {
                result.implicit.push(frame);
            } else {
                kept.push(frame);
            }
        }
        self.frames.extend(kept.into_iter().rev());
        result
    }

    /// Drops every frame opened by an open tag.
    pub fn clear_open(&mut self) -> Vec<StyleFrame> {
        let mut removed = Vec::new();
        let mut index = 1;
        while index < self.frames.len() {
            if self.frames[index].open {
                removed.push(self.frames.remove(index));
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Back to the sentinel alone.
    pub fn reset(&mut self) -> Vec<StyleFrame> {
        self.frames.drain(1..).collect()
    }

    /// Link targets still open, bottom first.
    pub fn open_links(&self) -> impl DoubleEndedIterator<Item = &FramePayload> {
        self.frames.iter().filter(|f| f.is_link()).map(|f| &f.payload)
    }
}
