//! Opportunistic URL detection.
//!
//! Detection is speculative: characters are emitted as plain text while the
//! candidate is scanned, and a Link fragment is inserted around them once the
//! URL ends. A candidate that does not pan out simply stays text.

use crate::{FormatKind, LineFormat, LinkFormat, ParseError};

use super::{MudParser, ParserState};

/// Schemes that are complete URLs without `//`.
const NO_SLASH_SCHEMES: &[&str] = &["mailto", "skype", "aim", "callto", "gtalk", "im", "itms", "msnim", "tel", "ymsgr"];

const URL_PUNCTUATION: &str = "-_.~!*';:@&=+$,/?%#[]()";

/// Trailing characters that end a sentence rather than the URL.
const TRAILING: &str = ".,;:!?'";

#[derive(Debug, Clone, Default)]
pub(super) struct UrlScan {
    /// Character offset of the first URL character in the line.
    start: usize,
    /// Offset after the scheme separator; the URL needs at least one character past it.
    found_at: usize,
    slashes: u8,
    prefix: &'static str,
    /// Expected closers of brackets opened inside the URL.
    closers: Vec<char>,
}

fn is_url_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || URL_PUNCTUATION.contains(ch)
}

fn is_boundary(ch: Option<char>) -> bool {
    ch.is_none_or(|c| c.is_whitespace() || matches!(c, '(' | '[' | '"' | '\'' | '<'))
}

/// Wraps `[start, end)` of `formats` in a Link / LinkEnd pair.
pub(super) fn insert_link(formats: &mut Vec<LineFormat>, start: usize, end: usize, link: LinkFormat) {
    let open_at = formats.iter().position(|f| f.offset > start).unwrap_or(formats.len());
    formats.insert(open_at, LineFormat::new(start, FormatKind::Link(link)));
    let close_at = formats.iter().skip(open_at + 1).position(|f| f.offset > end).map_or(formats.len(), |p| p + open_at + 1);
    formats.insert(close_at, LineFormat::new(end, FormatKind::LinkEnd));
}

impl MudParser {
    fn url_detection(&self) -> bool {
        self.options.enable_url_detection && self.styles.open_links().next().is_none()
    }

    /// Called after a `:` was put: looks back for a scheme name.
    pub(super) fn check_scheme(&mut self) {
        if !self.url_detection() {
            return;
        }
        let mut scheme: Vec<char> = self
            .line
            .text
            .chars()
            .rev()
            .skip(1)
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            .collect();
        scheme.reverse();
        if !scheme.first().is_some_and(|c| c.is_ascii_alphabetic()) {
            return;
        }
        let start = self.line.len - 1 - scheme.len();
        let before = start.checked_sub(1).and_then(|i| self.line.text.chars().nth(i));
        if !is_boundary(before) {
            return;
        }
        let scheme: String = scheme.into_iter().collect::<String>().to_ascii_lowercase();
        self.scan.url = UrlScan {
            start,
            found_at: self.line.len,
            ..Default::default()
        };
        self.state = if NO_SLASH_SCHEMES.contains(&scheme.as_str()) {
            ParserState::UrlFound
        } else {
            ParserState::UrlScan
        };
    }

    /// Called after a `.` was put: detects a `www.` prefix.
    pub(super) fn check_www(&mut self) {
        if !self.url_detection() || self.line.len < 4 {
            return;
        }
        let start = self.line.len - 4;
        let tail: String = self.line.text.chars().skip(start).collect();
        if !tail.eq_ignore_ascii_case("www.") {
            return;
        }
        let before = start.checked_sub(1).and_then(|i| self.line.text.chars().nth(i));
        if !is_boundary(before) {
            return;
        }
        self.scan.url = UrlScan {
            start,
            found_at: self.line.len,
            prefix: "http://",
            ..Default::default()
        };
        self.state = ParserState::UrlFound;
    }

    /// Expecting the `//` after a scheme.
    pub(super) fn url_scan_char(&mut self, ch: char) -> Result<(), ParseError> {
        if ch != '/' {
            self.state = ParserState::PlainText;
            return self.input.rewind();
        }
        self.put_char(ch);
        self.scan.url.slashes += 1;
        if self.scan.url.slashes == 2 {
            self.scan.url.found_at = self.line.len;
            self.state = ParserState::UrlFound;
        }
        Ok(())
    }

    pub(super) fn url_found_char(&mut self, ch: char) -> Result<(), ParseError> {
        match ch {
            '(' => self.scan.url.closers.push(')'),
            '[' => self.scan.url.closers.push(']'),
            ')' | ']' if self.scan.url.closers.last() == Some(&ch) => {
                self.scan.url.closers.pop();
            }
            '&' if self.markup_active() => return self.end_url(),
            c if is_url_char(c) && c != ')' && c != ']' => {}
            _ => return self.end_url(),
        }
        self.put_char(ch);
        Ok(())
    }

    fn end_url(&mut self) -> Result<(), ParseError> {
        self.finish_url();
        self.input.rewind()
    }

    /// Closes the URL being scanned, if it has any body.
    pub(super) fn finish_url(&mut self) {
        self.state = ParserState::PlainText;
        let Some((start, end, link)) = self.pending_url() else {
            self.scan.url = UrlScan::default();
            return;
        };
        self.scan.url = UrlScan::default();
        insert_link(&mut self.line.formats, start, end, link);
        self.push_style_block();
    }

    /// Link for the candidate scanned so far.
    pub(super) fn pending_url(&self) -> Option<(usize, usize, LinkFormat)> {
        let scan = &self.scan.url;
        let text: String = self.line.text.chars().skip(scan.start).collect();
        let body = text.trim_end_matches(|c| TRAILING.contains(c));
        let end = scan.start + body.chars().count();
        if end <= scan.found_at {
            return None;
        }
        let href = format!("{}{}", scan.prefix, body);
        Some((
            scan.start,
            end,
            LinkFormat {
                commands: vec![href.clone()],
                hint: href.clone(),
                href,
                ..Default::default()
            },
        ))
    }
}
