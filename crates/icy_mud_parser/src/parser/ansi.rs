//! ANSI escape handling: SGR attributes, CSI dispatch, xterm titles and the
//! MXP line mode selector `ESC[<n>z`.

use crate::{ColorCode, FontStyle, LineType, ParseError, ParserSink, Rgb};

use super::{MudParser, ParserState};

/// SGR attribute state: one attribute set plus the current fore/back colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SgrState {
    pub attributes: FontStyle,
    pub fore: ColorCode,
    pub back: ColorCode,
}

impl Default for SgrState {
    fn default() -> Self {
        Self {
            attributes: FontStyle::empty(),
            fore: ColorCode::DEFAULT_FORE,
            back: ColorCode::DEFAULT_BACK,
        }
    }
}

/// SGR lookup table entry - describes what a particular SGR parameter code means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SgrLutEntry {
    Reset,
    Bold,
    Faint,
    Set(FontStyle),
    Clear(FontStyle),
    Foreground(i32),
    Background(i32),
    /// 38;5;n or 38;2;r;g;b
    ExtendedForeground,
    /// 48;5;n or 48;2;r;g;b
    ExtendedBackground,
    /// zMUD log colors: 50-59 select a bold 30-39 foreground
    ZmudBold(i32),
    Undefined,
}

// SGR lookup table: maps SGR parameter values (0-107) to their meaning
static SGR_LUT: [SgrLutEntry; 108] = build_sgr_lut();

const fn build_sgr_lut() -> [SgrLutEntry; 108] {
    let mut lut = [SgrLutEntry::Undefined; 108];
    lut[0] = SgrLutEntry::Reset;
    lut[1] = SgrLutEntry::Bold;
    lut[2] = SgrLutEntry::Faint;
    lut[3] = SgrLutEntry::Set(FontStyle::ITALIC);
    lut[4] = SgrLutEntry::Set(FontStyle::UNDERLINE);
    lut[5] = SgrLutEntry::Set(FontStyle::SLOW_BLINK);
    lut[6] = SgrLutEntry::Set(FontStyle::RAPID_BLINK);
    lut[7] = SgrLutEntry::Set(FontStyle::INVERSE);
    lut[8] = SgrLutEntry::Set(FontStyle::HIDDEN);
    lut[9] = SgrLutEntry::Set(FontStyle::STRIKEOUT);
    lut[21] = SgrLutEntry::Set(FontStyle::DOUBLE_UNDERLINE);
    lut[22] = SgrLutEntry::Clear(FontStyle::BOLD.union(FontStyle::FAINT));
    lut[23] = SgrLutEntry::Clear(FontStyle::ITALIC);
    lut[24] = SgrLutEntry::Clear(FontStyle::UNDERLINE.union(FontStyle::DOUBLE_UNDERLINE));
    lut[25] = SgrLutEntry::Clear(FontStyle::SLOW_BLINK);
    lut[26] = SgrLutEntry::Clear(FontStyle::RAPID_BLINK);
    lut[27] = SgrLutEntry::Clear(FontStyle::INVERSE);
    lut[28] = SgrLutEntry::Clear(FontStyle::HIDDEN);
    lut[29] = SgrLutEntry::Clear(FontStyle::STRIKEOUT);
    let mut i = 0;
    while i < 8 {
        lut[30 + i] = SgrLutEntry::Foreground(30 + i as i32);
        lut[40 + i] = SgrLutEntry::Background(40 + i as i32);
        lut[90 + i] = SgrLutEntry::Foreground(90 + i as i32);
        lut[100 + i] = SgrLutEntry::Background(100 + i as i32);
        i += 1;
    }
    lut[38] = SgrLutEntry::ExtendedForeground;
    lut[39] = SgrLutEntry::Foreground(-1);
    lut[48] = SgrLutEntry::ExtendedBackground;
    lut[49] = SgrLutEntry::Background(-2);
    let mut i = 50;
    while i < 60 {
        lut[i] = SgrLutEntry::ZmudBold(i as i32 - 20);
        i += 1;
    }
    lut[53] = SgrLutEntry::Set(FontStyle::OVERLINE);
    lut[55] = SgrLutEntry::Clear(FontStyle::OVERLINE);
    lut
}

/// Reads the color of a `38;…`/`48;…` sequence starting at the selector.
/// Returns the color and the number of parameters consumed after `38`/`48`.
fn extended_color(params: &[Option<i32>]) -> Option<(ColorCode, usize)> {
    match params.first().copied().flatten() {
        Some(5) if params.len() >= 2 => {
            let index = params[1].unwrap_or(0);
            let code = u8::try_from(index).ok()?;
            Some((ColorCode::Palette(code), 2))
        }
        Some(2) if params.len() >= 4 => {
            let channel = |v: Option<i32>| u8::try_from(v.unwrap_or(0)).ok();
            let rgb = Rgb::new(channel(params[1])?, channel(params[2])?, channel(params[3])?);
            Some((ColorCode::TrueColor(rgb), 4))
        }
        _ => None,
    }
}

fn split_params(params: &str) -> Vec<Option<i32>> {
    params.split(';').map(|p| p.trim().parse::<i32>().ok()).collect()
}

impl SgrState {
    /// Applies the `;` separated parameters of an `ESC[…m` sequence.
    pub fn apply(&mut self, params: &str, sink: &mut dyn ParserSink) {
        let params = split_params(params);
        let mut i = 0;
        while i < params.len() {
            let code = params[i].unwrap_or(0);
            let entry = usize::try_from(code).ok().and_then(|c| SGR_LUT.get(c).copied()).unwrap_or(SgrLutEntry::Undefined);
            i += 1;
            match entry {
                SgrLutEntry::Reset => *self = SgrState::default(),
                SgrLutEntry::Bold => {
                    self.attributes.insert(FontStyle::BOLD);
                    self.attributes.remove(FontStyle::FAINT);
                }
                SgrLutEntry::Faint => {
                    self.attributes.insert(FontStyle::FAINT);
                    self.attributes.remove(FontStyle::BOLD);
                }
                SgrLutEntry::Set(style) => self.attributes.insert(style),
                SgrLutEntry::Clear(style) => self.attributes.remove(style),
                SgrLutEntry::Foreground(c) => self.fore = ColorCode::Sgr(c),
                SgrLutEntry::Background(c) => self.back = ColorCode::Sgr(c),
                SgrLutEntry::ExtendedForeground | SgrLutEntry::ExtendedBackground => match extended_color(&params[i..]) {
                    Some((color, used)) => {
                        if entry == SgrLutEntry::ExtendedForeground {
                            self.fore = color;
                        } else {
                            self.back = color;
                        }
                        i += used;
                    }
                    None => sink.report_error(ParseError::invalid_value("SGR", &code.to_string(), &format!("{:?}", &params[i..]))),
                },
                SgrLutEntry::ZmudBold(c) => {
                    self.fore = ColorCode::Sgr(c);
                    self.attributes.insert(FontStyle::BOLD);
                }
                SgrLutEntry::Undefined => {
                    log::trace!("ignoring SGR {code}");
                }
            }
        }
    }

    /// Rebuilds an SGR escape sequence that recreates this state.
    pub fn to_ansi(&self) -> String {
        let mut codes: Vec<String> = Vec::new();
        let mut color = |code: &ColorCode, extended: u8| match code {
            ColorCode::Sgr(c) => codes.push(c.to_string()),
            ColorCode::Palette(n) => codes.push(format!("{extended};5;{n}")),
            ColorCode::TrueColor(rgb) => codes.push(format!("{extended};2;{};{};{}", rgb.r, rgb.g, rgb.b)),
        };
        color(&self.fore, 38);
        color(&self.back, 48);
        const ATTRIBUTE_CODES: [(FontStyle, u8); 10] = [
            (FontStyle::INVERSE, 7),
            (FontStyle::BOLD, 1),
            (FontStyle::ITALIC, 3),
            (FontStyle::UNDERLINE, 4),
            (FontStyle::SLOW_BLINK, 5),
            (FontStyle::RAPID_BLINK, 6),
            (FontStyle::STRIKEOUT, 9),
            (FontStyle::FAINT, 2),
            (FontStyle::DOUBLE_UNDERLINE, 21),
            (FontStyle::OVERLINE, 53),
        ];
        for (style, code) in ATTRIBUTE_CODES {
            if self.attributes.contains(style) {
                codes.push(code.to_string());
            }
        }
        if self.attributes.contains(FontStyle::HIDDEN) {
            codes.push("8".to_string());
        }
        format!("\x1b[{}m", codes.join(";"))
    }
}

impl MudParser {
    pub(super) fn escape_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '[' => {
                self.scan.params.clear();
                self.state = ParserState::AnsiParams;
            }
            ']' => {
                self.scan.title.clear();
                self.state = ParserState::XTermTitle;
            }
            // cursor save/restore, keypad modes, line attributes and string terminators
            'D' | 'E' | 'M' | '1' | '2' | '7' | '8' | '>' | '=' | '#' | '\\' => {
                self.state = ParserState::PlainText;
            }
            _ => {
                self.report(sink, ParseError::unsupported(format!("ESC {}", crate::print_char_value(ch))));
                self.state = ParserState::PlainText;
            }
        }
        Ok(())
    }

    pub(super) fn params_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '\x20'..='\x3F' => self.scan.params.push(ch),
            '\x40'..='\x7E' => {
                self.state = ParserState::PlainText;
                let params = std::mem::take(&mut self.scan.params);
                self.csi_dispatch(ch, &params, sink);
            }
            _ => {
                // a control code or line break inside the parameters cuts the sequence short
                let sequence = format!("ESC[{}", self.scan.params);
                self.scan.params.clear();
                self.state = ParserState::PlainText;
                self.report(sink, ParseError::malformed("CSI sequence", sequence));
                self.input.rewind()?;
            }
        }
        Ok(())
    }

    fn csi_dispatch(&mut self, final_byte: char, params: &str, sink: &mut dyn ParserSink) {
        match final_byte {
            'm' => {
                self.sgr.apply(params, sink);
                self.push_style_block();
            }
            'z' => self.set_line_mode(params, sink),
            'J' if params.trim() == "2" => self.clear_screen(sink),
            'C' | 'K' | 's' | 'u' | 'l' | 'h' | 'A' | 'B' | 'D' | 'E' | 'F' | 'f' | 'G' | 'H' | 'n' | 'S' | 'T' | 'r' | 'J' => {
                self.close_open_frames();
            }
            _ => {
                self.report(sink, ParseError::unsupported(format!("CSI {params}{final_byte}")));
            }
        }
    }

    pub(super) fn title_char(&mut self, ch: char, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        match ch {
            '\x07' => {
                self.emit_title(sink);
                self.state = ParserState::PlainText;
            }
            '\x1B' => {
                // ESC \ terminates; the backslash is ignored by the escape state
                self.emit_title(sink);
                self.state = ParserState::AnsiEscape;
            }
            '\n' => {
                let sequence = format!("ESC]{}", self.scan.title);
                self.scan.title.clear();
                self.state = ParserState::PlainText;
                self.report(sink, ParseError::malformed("xterm title", sequence));
                self.input.rewind()?;
            }
            _ => self.scan.title.push(ch),
        }
        Ok(())
    }

    fn emit_title(&mut self, sink: &mut dyn ParserSink) {
        let title = std::mem::take(&mut self.scan.title);
        let (kind, title) = match title.split_once(';') {
            Some((kind, rest)) if kind.chars().all(|c| c.is_ascii_digit()) => (kind.parse::<u32>().unwrap_or(0), rest.to_string()),
            _ => (0, title),
        };
        sink.set_title(&title, kind);
    }

    /// `ESC[<n>z`: selects the MXP line mode.
    fn set_line_mode(&mut self, params: &str, sink: &mut dyn ParserSink) {
        let mode = params.split(';').rev().find(|p| !p.is_empty()).and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0);
        log::trace!("MXP line mode {mode}");
        let security = &mut self.security;
        let was_open = security.line_type == LineType::OPEN;
        security.on = true;
        security.no_break = false;
        security.paragraph = false;
        security.temp_secure_pending = false;
        if was_open {
            self.close_open_frames();
        }
        match mode {
            2 => {
                self.security.on = false;
                self.security.locked = false;
                self.security.line_type = LineType::LOCKED;
                self.close_open_frames();
            }
            3 => self.reset_all_mxp(),
            4 => {
                self.security.line_type = LineType::TEMP_SECURE;
                self.security.locked = false;
                self.security.temp_secure_pending = true;
                self.close_open_frames();
            }
            5 => {
                self.security.default_mode = LineType::OPEN;
                self.security.line_type = LineType::LOCK_OPEN;
                self.security.locked = true;
                self.close_open_frames();
            }
            6 => {
                self.security.default_mode = LineType::SECURE;
                self.security.line_type = LineType::LOCK_SECURE;
                self.security.locked = true;
                self.close_open_frames();
            }
            7 => {
                self.security.default_mode = LineType::LOCKED;
                self.security.line_type = LineType::LOCK_LOCKED;
                self.security.locked = true;
                self.close_open_frames();
            }
            n @ 0..=99 => {
                self.security.line_type = LineType(n as u8);
                self.security.locked = false;
                self.expand_line_tag(sink);
            }
            _ => self.close_open_frames(),
        }
        self.push_style_block();
    }

    /// `ESC[2J`: the current line is flushed and a screen worth of blank lines follows.
    fn clear_screen(&mut self, sink: &mut dyn ParserSink) {
        self.close_open_frames();
        self.break_line(sink);
        for _ in 0..self.options.window.height {
            self.break_line(sink);
        }
    }
}
