//! The MUD stream scanner.
//!
//! [`MudParser`] is a character state machine. Every piece of scanner state
//! (pending escape parameters, half read tags, the line being built) lives in
//! the parser itself, so input may be split at any character and the next
//! call simply continues where the previous one stopped.

mod ansi;
mod input;
mod line;
mod markup;
mod tags;
mod url;

use std::mem;

use crate::{
    ColorTable, LineSecurity, LineStore, LineType, ParseError, ParseQueue, ParseRequest, ParserOptions, ParserSink, Registries, Rgb, StyleStack,
    oem,
};

pub(crate) use ansi::SgrState;
use input::InputBuffer;
use line::LineBuilder;
use url::UrlScan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub(crate) enum ParserState {
    #[default]
    PlainText = 0,
    AnsiEscape = 1,
    AnsiParams = 2,
    XTermTitle = 3,
    MxpTag = 4,
    MxpTagQuoted = 5,
    MxpTagDblQuoted = 6,
    MxpTagArg = 7,
    MxpEntity = 8,
    MxpComment = 9,
    UrlScan = 10,
    UrlFound = 11,
    MspPrefix = 12,
    MspSound = 13,
    MspMusic = 14,
}

/// Accumulators of the sequence currently being scanned.
#[derive(Debug, Default)]
struct ScanState {
    params: String,
    title: String,
    /// Everything between `<` and `>`, quotes included.
    tag: String,
    quote_resume: ParserState,
    entity: String,
    comment: String,
    comment_resume: ParserState,
    msp: String,
    url: UrlScan,
}

pub struct MudParser {
    options: ParserOptions,
    colors: ColorTable,
    registries: Registries,
    styles: StyleStack,
    security: LineSecurity,
    sgr: SgrState,
    state: ParserState,
    scan: ScanState,
    input: InputBuffer,
    line: LineBuilder,
    lines: LineStore,
    queue: ParseQueue,
    /// Origin of the request being processed.
    remote: bool,
    /// Expansion depth of the character being processed.
    depth: u8,
    text_length: usize,
    end_of_line: bool,
    style_version: Option<String>,
    msp_eat_newline: bool,
    /// The opening markup of the current line tag was spliced into the input.
    line_tag_open: bool,
}

impl Default for MudParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl MudParser {
    pub fn new(options: ParserOptions) -> Self {
        let mut colors = ColorTable::new();
        for (code, color) in options.color_overrides() {
            if !colors.set_color(code, color) {
                log::warn!("ignoring invalid color override {code} = {color:?}");
            }
        }
        let lines = LineStore::new(options.max_lines);
        let mut parser = Self {
            options,
            colors,
            registries: Registries::default(),
            styles: StyleStack::new(),
            security: LineSecurity::default(),
            sgr: SgrState::default(),
            state: ParserState::PlainText,
            scan: ScanState::default(),
            input: InputBuffer::default(),
            line: LineBuilder::default(),
            lines,
            queue: ParseQueue::new(),
            remote: false,
            depth: 0,
            text_length: 0,
            end_of_line: true,
            style_version: None,
            msp_eat_newline: false,
            line_tag_open: false,
        };
        parser.start_line();
        parser
    }

    /// Parses a chunk of input. Equivalent to submitting a [`ParseRequest`]
    /// without `force` or `prepend_tail`.
    pub fn parse(&mut self, text: &str, remote: bool, sink: &mut dyn ParserSink) {
        let request = ParseRequest {
            remote,
            ..ParseRequest::new(text)
        };
        self.submit(request, sink);
    }

    /// Runs `request` now if nothing is pending (or it is forced), otherwise
    /// queues it behind the pending requests. The queue is drained before returning.
    pub fn submit(&mut self, request: ParseRequest, sink: &mut dyn ParserSink) {
        if request.force || self.queue.is_empty() {
            if !request.text.is_empty() {
                self.run_request(request, sink);
            }
        } else if !request.text.is_empty() {
            log::debug!("deferring parse request, {} pending", self.queue.len());
            self.queue.push(request);
        }
        while let Some(next) = self.queue.pop() {
            self.run_request(next, sink);
        }
    }

    /// Handle a sink can keep to defer input while it is being called.
    pub fn queue(&self) -> ParseQueue {
        self.queue.clone()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_ends_with_line(&self) -> bool {
        self.queue.tail_ends_line()
    }

    /// Visible characters produced so far, line breaks included.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    /// False while the last emitted line is a soft fragment.
    pub fn end_of_line(&self) -> bool {
        self.end_of_line
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ParserOptions) {
        self.lines.set_max_lines(options.max_lines);
        for (code, color) in options.color_overrides() {
            if !self.colors.set_color(code, color) {
                log::warn!("ignoring invalid color override {code} = {color:?}");
            }
        }
        self.options = options;
    }

    pub fn update_window(&mut self, width: usize, height: usize) {
        self.options.window.width = width;
        self.options.window.height = height;
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut ColorTable {
        &mut self.colors
    }

    /// Overrides a color slot; invalid colors are rejected and leave the table untouched.
    pub fn set_color(&mut self, code: i32, spec: &str) -> bool {
        self.colors.set_color(code, spec)
    }

    pub fn get_color(&self, code: i32) -> Rgb {
        self.colors.get_color(code)
    }

    pub fn lines(&self) -> &LineStore {
        &self.lines
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    pub fn line_security(&self) -> &LineSecurity {
        &self.security
    }

    pub fn style_stack(&self) -> &StyleStack {
        &self.styles
    }

    /// Value of `<VERSION x>` sent by the server.
    pub fn style_version(&self) -> Option<&str> {
        self.style_version.as_deref()
    }

    /// Value of an entity the server declared with `PUBLISH`.
    pub fn public_entity(&self, name: &str) -> Option<&str> {
        self.registries.entities.get(&name.to_string()).filter(|e| e.publish).map(|e| e.value.as_str())
    }

    /// SGR sequence recreating the current attributes and colors.
    pub fn current_ansi_code(&self) -> String {
        self.sgr.to_ansi()
    }

    /// Drops stored lines, the line being built and any half scanned sequence.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recover();
        self.end_of_line = true;
        self.start_line();
    }

    /// Forgets every element, entity and line tag and all MXP styling.
    pub fn clear_mxp(&mut self) {
        self.registries.clear();
        self.reset_mxp();
    }

    /// Back to the default MXP style. Open links are ended and pending captures dropped.
    pub fn reset_mxp(&mut self) {
        self.close_link_blocks();
        self.styles.reset();
        while self.security.pop_capture().is_some() {}
        self.push_style_block();
    }

    pub fn reset_mxp_line(&mut self) {
        self.security.reset();
        self.line_tag_open = false;
    }

    fn run_request(&mut self, request: ParseRequest, sink: &mut dyn ParserSink) {
        self.remote = request.remote;
        let suspended = if request.prepend_tail && self.state != ParserState::PlainText {
            Some((mem::take(&mut self.state), mem::take(&mut self.scan)))
        } else {
            None
        };
        self.input.load(&request.text);
        if let Err(err) = self.run(sink) {
            log::warn!("parse pass failed: {err}");
            if self.options.enable_debug {
                sink.debug(&err.to_string());
            }
            sink.report_error(err);
            self.recover();
        }
        if let Some((state, scan)) = suspended {
            if self.state == ParserState::PlainText {
                self.state = state;
                self.scan = scan;
            } else {
                self.report(sink, ParseError::malformed("suspended sequence", scan.tag));
            }
        }
        self.input.clear();
        self.flush_soft(sink);
    }

    fn run(&mut self, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        while let Some(next) = self.input.next() {
            if next.fresh {
                self.line.raw.push(next.ch);
            }
            self.depth = next.depth;
            let ch = next.ch;
            match self.state {
                ParserState::PlainText => self.plain_char(ch, sink)?,
                ParserState::AnsiEscape => self.escape_char(ch, sink)?,
                ParserState::AnsiParams => self.params_char(ch, sink)?,
                ParserState::XTermTitle => self.title_char(ch, sink)?,
                ParserState::MxpTag => self.tag_char(ch, sink)?,
                ParserState::MxpTagArg => self.tag_arg_char(ch, sink)?,
                ParserState::MxpTagQuoted => self.quoted_char(ch, '\'', sink)?,
                ParserState::MxpTagDblQuoted => self.quoted_char(ch, '"', sink)?,
                ParserState::MxpEntity => self.entity_char(ch, sink)?,
                ParserState::MxpComment => self.comment_char(ch, sink)?,
                ParserState::UrlScan => self.url_scan_char(ch)?,
                ParserState::UrlFound => self.url_found_char(ch)?,
                ParserState::MspPrefix => self.msp_prefix_char(ch)?,
                ParserState::MspSound | ParserState::MspMusic => self.msp_args_char(ch, sink)?,
            }
        }
        Ok(())
    }

    /// Abandons the sequence being scanned and any pending input.
    fn recover(&mut self) {
        self.state = ParserState::PlainText;
        self.scan = ScanState::default();
        self.input.clear();
        self.msp_eat_newline = false;
    }

    fn plain_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        if self.security.temp_secure_pending {
            self.security.temp_secure_pending = false;
            if ch != '<' {
                self.security.line_type = LineType::OPEN;
                self.security.on = false;
            }
        }
        if self.msp_eat_newline {
            match ch {
                '\r' => return Ok(()),
                '\n' => {
                    self.msp_eat_newline = false;
                    return Ok(());
                }
                _ => self.msp_eat_newline = false,
            }
        }
        let emulate = self.options.emulate_control_codes;
        match ch {
            '\x1B' if emulate => self.state = ParserState::AnsiEscape,
            '\n' => self.newline(sink)?,
            '\r' if emulate => {}
            '\x07' if emulate => self.bell(sink),
            '\x08' if emulate => self.backspace(),
            '\t' if emulate => self.tab(),
            '<' if self.markup_active() => {
                self.scan.tag.clear();
                self.state = ParserState::MxpTag;
            }
            '&' if self.markup_active() => {
                self.scan.entity.clear();
                self.state = ParserState::MxpEntity;
            }
            ':' => {
                self.put_char(ch);
                self.check_scheme();
            }
            '.' => {
                self.put_char(ch);
                self.check_www();
            }
            '!' if self.options.enable_msp && self.line.len == 0 => {
                self.scan.msp.clear();
                self.scan.msp.push(ch);
                self.state = ParserState::MspPrefix;
            }
            c if (c as u32) < 0x20 || c == '\x7F' => {
                if self.options.emulate_terminal {
                    if let Some(glyph) = oem::control_glyph(c) {
                        self.put_char(glyph);
                    }
                } else if self.options.display_control_codes {
                    if let Some(picture) = oem::control_picture(c) {
                        self.put_char(picture);
                    }
                }
            }
            c => {
                let c = if self.options.emulate_terminal { oem::high_glyph(c) } else { c };
                self.put_char(c);
            }
        }
        Ok(())
    }

    fn markup_active(&self) -> bool {
        self.options.enable_mxp && self.security.active()
    }

    fn bell(&mut self, sink: &mut dyn ParserSink) {
        if self.options.enable_bell {
            sink.bell();
        }
        if self.options.emulate_terminal || self.options.display_control_codes {
            self.put_char('\u{2407}');
        }
    }

    fn backspace(&mut self) {
        if self.line.pop_char() {
            self.text_length = self.text_length.saturating_sub(1);
            self.security.uncapture();
        }
        if self.options.display_control_codes {
            self.put_char('\u{25D8}');
        }
    }

    fn tab(&mut self) {
        let width = self.options.tab_width.max(1);
        for _ in 0..width - self.line.len % width {
            self.put_char(' ');
        }
    }

    fn newline(&mut self, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        if self.security.no_break || self.security.paragraph {
            self.security.no_break = false;
            return Ok(());
        }
        let mut gag = false;
        if !self.security.locked {
            if self.line_tag_open && !self.security.line_expanded {
                // close the line tag markup first, then see this newline again
                self.security.line_expanded = true;
                self.input.rewind()?;
                self.close_line_tag(sink);
                return Ok(());
            }
            let line_type = self.security.line_type;
            if line_type != LineType::OPEN {
                sink.tag_end(line_type, &self.line.text);
            }
            gag = self.active_line_tag().is_some_and(|tag| tag.gag);
            self.security.line_expanded = false;
            self.line_tag_open = false;
            self.close_link_blocks();
            if self.security.on {
                self.close_open_frames();
            }
            self.security.on = false;
            self.security.line_type = self.security.default_mode;
            if !self.options.enable_mxp {
                self.styles.reset();
            }
        } else {
            self.close_link_blocks();
            if self.security.on {
                self.close_open_frames();
            }
        }
        let depth = self.security.capture_depth();
        if depth > 0 {
            self.report(sink, ParseError::CaptureImbalance { depth });
        }
        if !gag {
            self.security.capture("\n");
        }
        self.line.gagged |= gag;
        self.finish_line(sink);
        self.text_length += 1;
        Ok(())
    }

    /// Full MXP reset: styles, line state and everything the server defined.
    fn reset_all_mxp(&mut self) {
        let on = self.security.on;
        self.styles.reset();
        self.security.reset();
        self.security.on = on;
        self.line_tag_open = false;
        self.registries.clear_remote();
        self.push_style_block();
    }

    /// Drops the frames opened by open tags.
    fn close_open_frames(&mut self) {
        if !self.styles.clear_open().is_empty() {
            self.push_style_block();
        }
    }

    /// Logs a non fatal fault and hands it to the sink.
    fn report(&mut self, sink: &mut dyn ParserSink, error: ParseError) {
        log::debug!("{error}");
        if self.options.enable_debug {
            sink.debug(&error.to_string());
        }
        sink.report_error(error);
    }

    fn debug(&mut self, sink: &mut dyn ParserSink, message: &str) {
        log::debug!("{message}");
        if self.options.enable_debug {
            sink.debug(message);
        }
    }
}
