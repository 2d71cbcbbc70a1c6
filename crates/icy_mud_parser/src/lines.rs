//! Emitted lines kept for link expiry.
//!
//! Every MXP link or send fragment is indexed by its expire key so `<EXPIRE>`
//! only visits the lines that carry matching links.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::{FormatKind, LineFormat, ParsedLine};

/// Stable line number, counting every line ever stored.
pub type LineId = u64;

#[derive(Debug, Default)]
pub struct LineStore {
    lines: VecDeque<(LineId, ParsedLine)>,
    next_id: LineId,
    max_lines: usize,
    /// fragment positions of keyed links: key -> line -> indices
    keyed: HashMap<String, BTreeMap<LineId, Vec<usize>>>,
    unkeyed: BTreeMap<LineId, Vec<usize>>,
}

impl LineStore {
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Default::default()
        }
    }

    pub fn set_max_lines(&mut self, max_lines: usize) {
        self.max_lines = max_lines;
        self.trim();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &ParsedLine> {
        self.lines.iter().map(|(_, line)| line)
    }

    pub fn line(&self, id: LineId) -> Option<&ParsedLine> {
        let first = self.lines.front()?.0;
        self.lines.get(id.checked_sub(first)? as usize).map(|(_, line)| line)
    }

    pub fn last(&self) -> Option<&ParsedLine> {
        self.lines.back().map(|(_, line)| line)
    }

    /// Stores `line`, replacing the previous line if that one was a soft fragment.
    pub fn push(&mut self, line: ParsedLine) -> LineId {
        let replace = self.lines.back().is_some_and(|(_, last)| last.fragment);
        let id = if replace {
            let id = self.next_id - 1;
            self.unindex(id);
            self.lines.pop_back();
            id
        } else {
            self.next_id += 1;
            self.next_id - 1
        };
        self.index(id, &line.formats);
        self.lines.push_back((id, line));
        self.trim();
        id
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.keyed.clear();
        self.unkeyed.clear();
    }

    /// Retires MXP links carrying `key`, or every MXP link when `key` is `None`.
    ///
    /// Returns the ids of the lines that changed.
    pub fn expire(&mut self, key: Option<&str>) -> Vec<LineId> {
        let mut targets: BTreeMap<LineId, Vec<usize>> = BTreeMap::new();
        match key {
            Some(key) => {
                if let Some(map) = self.keyed.remove(key) {
                    targets = map;
                }
            }
            None => {
                for (_, map) in self.keyed.drain() {
                    for (id, indices) in map {
                        targets.entry(id).or_default().extend(indices);
                    }
                }
                for (id, indices) in std::mem::take(&mut self.unkeyed) {
                    targets.entry(id).or_default().extend(indices);
                }
            }
        }
        let Some(first) = self.lines.front().map(|(id, _)| *id) else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        for (id, mut indices) in targets {
            let Some((_, line)) = id.checked_sub(first).and_then(|offset| self.lines.get_mut(offset as usize)) else {
                continue;
            };
            indices.sort_unstable();
            let mut touched = false;
            for index in indices {
                touched |= expire_link(&mut line.formats, index);
            }
            if touched {
                changed.push(id);
            }
        }
        changed
    }

    fn index(&mut self, id: LineId, formats: &[LineFormat]) {
        for (i, format) in formats.iter().enumerate() {
            let link = match &format.kind {
                FormatKind::MxpLink(link) | FormatKind::MxpSend(link) => link,
                _ => continue,
            };
            match link.expire.as_deref().filter(|k| !k.is_empty()) {
                Some(key) => self.keyed.entry(key.to_string()).or_default().entry(id).or_default().push(i),
                None => self.unkeyed.entry(id).or_default().push(i),
            }
        }
    }

    fn unindex(&mut self, id: LineId) {
        self.unkeyed.remove(&id);
        self.keyed.retain(|_, map| {
            map.remove(&id);
            !map.is_empty()
        });
    }

    fn trim(&mut self) {
        if self.max_lines == 0 {
            return;
        }
        while self.lines.len() > self.max_lines {
            if let Some((id, _)) = self.lines.pop_front() {
                self.unindex(id);
            }
        }
    }
}

/// Turns the link opener at `index` into `MxpExpired` and its balancing closer into `MxpSkip`.
pub(crate) fn expire_link(formats: &mut [LineFormat], index: usize) -> bool {
    let Some(format) = formats.get_mut(index) else {
        return false;
    };
    let (open_id, close_id) = match &format.kind {
        FormatKind::MxpLink(_) => (3, 4),
        FormatKind::MxpSend(_) => (6, 7),
        _ => return false,
    };
    let kind = std::mem::replace(&mut format.kind, FormatKind::MxpSkip);
    if let FormatKind::MxpLink(link) | FormatKind::MxpSend(link) = kind {
        format.kind = FormatKind::MxpExpired(link);
    }
    let mut depth = 0usize;
    for next in formats.iter_mut().skip(index + 1) {
        let id = next.kind.kind_id();
        if id == open_id {
            depth += 1;
        } else if id == close_id {
            if depth == 0 {
                next.kind = FormatKind::MxpSkip;
                break;
            }
            depth -= 1;
        }
    }
    true
}
