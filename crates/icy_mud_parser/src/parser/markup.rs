//! Scanning of MXP tags, entities and comments plus MSP directives.
//!
//! These states only collect characters. A complete tag is handed to the tag
//! dispatcher; an interrupted one is replayed as literal text.

use std::mem;

use crate::{ParseError, ParserSink, SoundKind, SoundRequest, mxp};

use super::{MudParser, ParserState};

const SOUND_PREFIX: &str = "!!SOUND(";
const MUSIC_PREFIX: &str = "!!MUSIC(";

impl MudParser {
    /// Reading the tag name right after `<`.
    pub(super) fn tag_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '>' => return self.end_tag(sink),
            '\n' | '\x1B' | '<' => return self.replay_tag(sink),
            '\'' | '"' => self.open_quote(ch),
            c if c.is_whitespace() => {
                self.scan.tag.push(c);
                self.state = ParserState::MxpTagArg;
            }
            c => {
                self.scan.tag.push(c);
                if self.scan.tag == "!--" {
                    self.scan.tag.clear();
                    self.start_comment(ParserState::PlainText);
                }
            }
        }
        Ok(())
    }

    /// Reading tag arguments.
    pub(super) fn tag_arg_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '>' => return self.end_tag(sink),
            '\n' | '\x1B' => return self.replay_tag(sink),
            '\'' | '"' => self.open_quote(ch),
            c => {
                self.scan.tag.push(c);
                if self.scan.tag.ends_with("<!--") {
                    let len = self.scan.tag.len() - 4;
                    self.scan.tag.truncate(len);
                    self.start_comment(ParserState::MxpTagArg);
                }
            }
        }
        Ok(())
    }

    pub(super) fn quoted_char(&mut self, ch: char, quote: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '\n' | '\x1B' => self.replay_tag(sink),
            c => {
                self.scan.tag.push(c);
                if c == quote {
                    self.state = self.scan.quote_resume;
                }
                Ok(())
            }
        }
    }

    pub(super) fn comment_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        if ch == '\n' || ch == '\x1B' {
            let comment = mem::take(&mut self.scan.comment);
            self.report(sink, ParseError::malformed("comment", format!("<!--{comment}")));
            self.state = self.scan.comment_resume;
            return self.input.rewind();
        }
        self.scan.comment.push(ch);
        if self.scan.comment.ends_with("-->") {
            self.scan.comment.clear();
            self.state = self.scan.comment_resume;
        }
        Ok(())
    }

    fn open_quote(&mut self, quote: char) {
        self.scan.tag.push(quote);
        self.scan.quote_resume = ParserState::MxpTagArg;
        self.state = if quote == '\'' {
            ParserState::MxpTagQuoted
        } else {
            ParserState::MxpTagDblQuoted
        };
    }

    fn start_comment(&mut self, resume: ParserState) {
        self.scan.comment.clear();
        self.scan.comment_resume = resume;
        self.state = ParserState::MxpComment;
    }

    fn end_tag(&mut self, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        let body = mem::take(&mut self.scan.tag);
        self.state = ParserState::PlainText;
        self.dispatch_tag(&body, sink)
    }

    /// Gives up on the tag: it becomes text and `ch` is scanned again as text.
    fn replay_tag(&mut self, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        let literal = format!("<{}", mem::take(&mut self.scan.tag));
        self.report(sink, ParseError::malformed("tag", literal.clone()));
        self.state = ParserState::PlainText;
        self.put_literal(&literal);
        self.input.rewind()
    }

    pub(super) fn entity_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        if ch == ';' {
            let name = mem::take(&mut self.scan.entity);
            self.state = ParserState::PlainText;
            self.resolve_entity(&name, sink);
            return Ok(());
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '#' | '_' | '-' | '.') {
            self.scan.entity.push(ch);
            return Ok(());
        }
        let name = mem::take(&mut self.scan.entity);
        self.state = ParserState::PlainText;
        if !name.is_empty() {
            self.report(sink, ParseError::malformed("entity", format!("&{name}")));
        }
        self.put_char('&');
        self.put_literal(&name);
        self.input.rewind()
    }

    /// Custom entities expand into the input; standard ones become one character.
    fn resolve_entity(&mut self, name: &str, sink: &mut dyn ParserSink) {
        if let Some(value) = self.registries.entities.get(&name.to_string()).map(|e| e.value.clone()) {
            if !value.is_empty() && !self.input.inject(&value, self.depth.saturating_add(1)) {
                self.report(sink, ParseError::unsupported(format!("entity &{name}; nested too deep")));
            }
            return;
        }
        match mxp::decode_entity(name) {
            Some(ch) => self.put_char(ch),
            None => {
                self.debug(sink, &format!("unknown entity &{name};"));
                self.put_literal(&format!("&{name};"));
            }
        }
    }

    /// Matching `!!SOUND(` or `!!MUSIC(` at the start of a line.
    pub(super) fn msp_prefix_char(&mut self, ch: char) -> Result<(), ParseError> {
        self.scan.msp.push(ch);
        let upper = self.scan.msp.to_ascii_uppercase();
        if upper == SOUND_PREFIX || upper == MUSIC_PREFIX {
            self.state = if upper == SOUND_PREFIX {
                ParserState::MspSound
            } else {
                ParserState::MspMusic
            };
            self.scan.msp.clear();
            return Ok(());
        }
        if SOUND_PREFIX.starts_with(&upper) || MUSIC_PREFIX.starts_with(&upper) {
            return Ok(());
        }
        self.scan.msp.pop();
        let literal = mem::take(&mut self.scan.msp);
        self.state = ParserState::PlainText;
        self.put_literal(&literal);
        self.input.rewind()
    }

    pub(super) fn msp_args_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        let kind = if self.state == ParserState::MspSound {
            SoundKind::Sound
        } else {
            SoundKind::Music
        };
        match ch {
            ')' => {
                let args = mxp::split_args(&mem::take(&mut self.scan.msp));
                self.state = ParserState::PlainText;
                let request = SoundRequest::from_args(kind, &args);
                log::debug!("msp {:?} {}", kind, request.location());
                match kind {
                    SoundKind::Sound => sink.sound(&request),
                    SoundKind::Music => sink.music(&request),
                }
                self.msp_eat_newline = true;
                Ok(())
            }
            '\n' | '\x1B' => {
                let prefix = if kind == SoundKind::Sound { SOUND_PREFIX } else { MUSIC_PREFIX };
                let literal = format!("{prefix}{}", mem::take(&mut self.scan.msp));
                self.report(sink, ParseError::malformed("msp directive", literal.clone()));
                self.state = ParserState::PlainText;
                self.put_literal(&literal);
                self.input.rewind()
            }
            c => {
                self.scan.msp.push(c);
                Ok(())
            }
        }
    }
}
