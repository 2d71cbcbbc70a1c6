use crate::ParseError;

/// Nesting limit for text spliced in by entities, elements and line tags.
pub(super) const MAX_EXPANSION_DEPTH: u8 = 16;

#[derive(Debug, Clone, Copy)]
pub(super) struct InputChar {
    pub ch: char,
    /// How many expansions produced this character, 0 for wire input.
    pub depth: u8,
    /// Not yet recorded in the raw line.
    pub fresh: bool,
}

/// Indexable input with a cursor. Expansions are spliced in at the cursor
/// and characters can be pushed back to be scanned again in another state.
#[derive(Debug, Default)]
pub(super) struct InputBuffer {
    chars: Vec<InputChar>,
    pos: usize,
}

impl InputBuffer {
    pub fn load(&mut self, text: &str) {
        self.chars.clear();
        self.pos = 0;
        self.chars.extend(text.chars().map(|ch| InputChar { ch, depth: 0, fresh: true }));
    }

    pub fn next(&mut self) -> Option<InputChar> {
        let ch = *self.chars.get(self.pos)?;
        self.pos += 1;
        Some(ch)
    }

    /// Steps back over the last character so it is read again.
    pub fn rewind(&mut self) -> Result<(), ParseError> {
        if self.pos == 0 {
            return Err(ParseError::Internal("rewind past the start of input".to_string()));
        }
        self.pos -= 1;
        self.chars[self.pos].fresh = false;
        Ok(())
    }

    /// Inserts `text` at the cursor. Fails once the nesting limit is reached.
    pub fn inject(&mut self, text: &str, depth: u8) -> bool {
        if depth > MAX_EXPANSION_DEPTH {
            return false;
        }
        let pos = self.pos;
        self.chars.splice(pos..pos, text.chars().map(|ch| InputChar { ch, depth, fresh: false }));
        true
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.pos = 0;
    }
}
