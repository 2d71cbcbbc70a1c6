//! Color model: the resolved color table and the tagged color references
//! the scanner keeps for the current SGR state.

use std::fmt::Display;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

lazy_static::lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    static ref RGB_COLOR: Regex = Regex::new(r"^rgba?\(\s*(\d{1,3})\s*[,;]\s*(\d{1,3})\s*[,;]\s*(\d{1,3})\s*(?:[,;]\s*[0-9.]+\s*)?\)$").unwrap();
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let caps = HEX_COLOR.captures(hex.trim())?;
        let digits = caps.get(1)?.as_str();
        if digits.len() == 3 {
            let mut channels = digits.chars().map(|c| c.to_digit(16).map(|v| (v * 17) as u8));
            Some(Self::new(channels.next()??, channels.next()??, channels.next()??))
        } else {
            let value = u32::from_str_radix(digits, 16).ok()?;
            Some(Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
        }
    }

    /// Parses a markup color: `#rgb`, `#rrggbb`, `rgb(r,g,b)` or an HTML color name.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        if spec.starts_with('#') {
            return Self::from_hex(spec);
        }
        if let Some(caps) = RGB_COLOR.captures(&spec.to_ascii_lowercase()) {
            let channel = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u16>().ok()).filter(|v| *v <= 255).map(|v| v as u8);
            return Some(Self::new(channel(1)?, channel(2)?, channel(3)?));
        }
        let lower = spec.to_ascii_lowercase();
        NAMED_COLORS
            .binary_search_by(|(name, _)| name.cmp(&lower.as_str()))
            .ok()
            .map(|idx| {
                let value = NAMED_COLORS[idx].1;
                Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
            })
    }

    /// Moves every channel toward 255 by `pct` of its own value.
    pub fn increase(self, pct: f64) -> Self {
        let up = |c: u8| (c as f64 + channel_step(c, pct)).min(255.0) as u8;
        Self::new(up(self.r), up(self.g), up(self.b))
    }

    /// Moves every channel toward 0 by `pct` of its own value.
    pub fn decrease(self, pct: f64) -> Self {
        let down = |c: u8| (c as f64 - channel_step(c, pct)).max(0.0) as u8;
        Self::new(down(self.r), down(self.g), down(self.b))
    }
}

// ceil(c * pct), ignoring float noise such as 100 * 0.15 = 15.000000000000002
fn channel_step(c: u8, pct: f64) -> f64 {
    (c as f64 * pct - 1e-9).ceil().max(0.0)
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Brightens a color string, returning the input unchanged if it is not a color.
pub fn increase_color(spec: &str, pct: f64) -> String {
    match Rgb::parse(spec) {
        Some(rgb) => rgb.increase(pct).to_hex(),
        None => spec.to_string(),
    }
}

/// Darkens a color string, returning the input unchanged if it is not a color.
pub fn decrease_color(spec: &str, pct: f64) -> String {
    match Rgb::parse(spec) {
        Some(rgb) => rgb.decrease(pct).to_hex(),
        None => spec.to_string(),
    }
}

/// Color reference held by the SGR state.
///
/// `Sgr` keeps the legacy signed codes (30-37, 40-47, 90-97, 100-107 and the
/// negative UI roles), `Palette` an xterm 256 color index and `TrueColor` a
/// literal `38;2;r;g;b` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCode {
    Sgr(i32),
    Palette(u8),
    TrueColor(Rgb),
}

impl ColorCode {
    pub const DEFAULT_FORE: ColorCode = ColorCode::Sgr(37);
    pub const DEFAULT_BACK: ColorCode = ColorCode::Sgr(40);

    /// Decodes the packed signed form, where `-(16 + n)` addresses palette slot `n`.
    pub fn from_legacy(code: i32) -> Self {
        if (-(16 + 255)..=-16).contains(&code) {
            ColorCode::Palette((-(code + 16)) as u8)
        } else {
            ColorCode::Sgr(code)
        }
    }

    pub fn to_legacy(&self) -> Option<i32> {
        match self {
            ColorCode::Sgr(code) => Some(*code),
            ColorCode::Palette(n) => Some(-(16 + *n as i32)),
            ColorCode::TrueColor(_) => None,
        }
    }
}

pub const COLOR_SLOTS: usize = 281;

pub const FAINT_SLOT: usize = 256;
pub const BACKGROUND_SLOT: usize = 264;
pub const INFO_BACKGROUND_SLOT: usize = 272;
pub const INFO_TEXT_SLOT: usize = 273;
pub const LOCAL_ECHO_BACK_SLOT: usize = 274;
pub const LOCAL_ECHO_TEXT_SLOT: usize = 275;
pub const DEFAULT_BACK_SLOT: usize = 276;
pub const DEFAULT_FORE_SLOT: usize = 277;
pub const ERROR_FORE_SLOT: usize = 278;
pub const ERROR_BACK_SLOT: usize = 279;
pub const DEFAULT_BRIGHT_FORE_SLOT: usize = 280;

/// Synthetic UI role codes understood by [`ColorTable::get_color`].
pub mod ui {
    pub const DEFAULT_FORE: i32 = -1;
    pub const DEFAULT_BACK: i32 = -2;
    pub const LOCAL_ECHO_TEXT: i32 = -3;
    pub const LOCAL_ECHO_BACK: i32 = -4;
    pub const INFO_TEXT: i32 = -7;
    pub const INFO_BACKGROUND: i32 = -8;
    pub const DEFAULT_BRIGHT_FORE: i32 = -10;
    pub const ERROR_FORE: i32 = -11;
    pub const ERROR_BACK: i32 = -12;
}

const BASE_COLORS: [Rgb; 8] = [
    Rgb::new(0, 0, 0),
    Rgb::new(128, 0, 0),
    Rgb::new(0, 128, 0),
    Rgb::new(128, 128, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(128, 0, 128),
    Rgb::new(0, 128, 128),
    Rgb::new(187, 187, 187),
];

const BRIGHT_COLORS: [Rgb; 8] = [
    Rgb::new(128, 128, 128),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

const FAINT_COLORS: [Rgb; 8] = [
    Rgb::new(0, 0, 0),
    Rgb::new(118, 0, 0),
    Rgb::new(0, 108, 0),
    Rgb::new(145, 136, 0),
    Rgb::new(0, 0, 167),
    Rgb::new(108, 0, 108),
    Rgb::new(0, 108, 108),
    Rgb::new(161, 161, 161),
];

const UI_COLORS: [Rgb; 9] = [
    Rgb::new(0, 0, 0),       // info background
    Rgb::new(0, 255, 255),   // info text
    Rgb::new(0, 0, 0),       // local echo background
    Rgb::new(255, 255, 0),   // local echo text
    Rgb::new(0, 0, 0),       // default background
    Rgb::new(229, 229, 229), // default foreground
    Rgb::new(205, 0, 0),     // error foreground
    Rgb::new(229, 229, 229), // error background
    Rgb::new(255, 255, 255), // default bright foreground
];

/// Resolved RGB values for every color code the scanner can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    slots: Vec<Rgb>,
}

impl Default for ColorTable {
    fn default() -> Self {
        let mut slots = vec![Rgb::default(); COLOR_SLOTS];
        slots[0..8].copy_from_slice(&BASE_COLORS);
        slots[8..16].copy_from_slice(&BRIGHT_COLORS);
        for (i, slot) in slots.iter_mut().enumerate().take(232).skip(16) {
            let n = i - 16;
            let level = |v: usize| if v == 0 { 0 } else { (v * 40 + 55) as u8 };
            *slot = Rgb::new(level(n / 36), level((n / 6) % 6), level(n % 6));
        }
        for (i, slot) in slots.iter_mut().enumerate().take(256).skip(232) {
            let gray = ((i - 232) * 10 + 8) as u8;
            *slot = Rgb::new(gray, gray, gray);
        }
        slots[FAINT_SLOT..FAINT_SLOT + 8].copy_from_slice(&FAINT_COLORS);
        slots[BACKGROUND_SLOT..BACKGROUND_SLOT + 8].copy_from_slice(&BASE_COLORS);
        slots[INFO_BACKGROUND_SLOT..COLOR_SLOTS].copy_from_slice(&UI_COLORS);
        Self { slots }
    }
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a legacy signed color code to its table slot.
    pub fn slot(code: i32) -> Option<usize> {
        let slot = match code {
            -12 => ERROR_BACK_SLOT,
            -11 => ERROR_FORE_SLOT,
            -10 => DEFAULT_BRIGHT_FORE_SLOT,
            -8 => INFO_BACKGROUND_SLOT,
            -7 => INFO_TEXT_SLOT,
            -4 => LOCAL_ECHO_BACK_SLOT,
            -3 => LOCAL_ECHO_TEXT_SLOT,
            -2 | 49 => DEFAULT_BACK_SLOT,
            -1 | 39 => DEFAULT_FORE_SLOT,
            0..=7 => code as usize,
            30..=37 => (code - 30) as usize,
            40..=47 => BACKGROUND_SLOT + (code - 40) as usize,
            8..=15 => code as usize,
            90..=97 => (code - 90 + 8) as usize,
            100..=107 => (code - 100 + 8) as usize,
            300 | 310 | 320 | 330 | 340 | 350 | 360 | 370 => ((code - 300) / 10 + 8) as usize,
            400 | 410 | 420 | 430 | 440 | 450 | 460 | 470 => ((code - 400) / 10 + 8) as usize,
            3000 | 3100 | 3200 | 3300 | 3400 | 3500 | 3600 | 3700 => FAINT_SLOT + ((code - 3000) / 100) as usize,
            4000 | 4100 | 4200 | 4300 | 4400 | 4500 | 4600 | 4700 => FAINT_SLOT + ((code - 4000) / 100) as usize,
            c if c <= -16 => {
                let index = (-(c + 16)) as usize;
                if index >= COLOR_SLOTS {
                    return None;
                }
                index
            }
            _ => return None,
        };
        Some(slot)
    }

    /// Resolves a legacy code; unknown codes fall back to the default foreground.
    pub fn get_color(&self, code: i32) -> Rgb {
        self.slots[Self::slot(code).unwrap_or(DEFAULT_FORE_SLOT)]
    }

    pub fn slot_color(&self, slot: usize) -> Rgb {
        self.slots.get(slot).copied().unwrap_or(self.slots[DEFAULT_FORE_SLOT])
    }

    /// Overrides a slot. Returns false, leaving the table untouched, if the
    /// code has no slot or `spec` is not a color.
    pub fn set_color(&mut self, code: i32, spec: &str) -> bool {
        let Some(slot) = Self::slot(code) else {
            return false;
        };
        let Some(rgb) = Rgb::parse(spec) else {
            return false;
        };
        self.slots[slot] = rgb;
        true
    }

    pub fn resolve(&self, code: &ColorCode) -> Rgb {
        match code {
            ColorCode::Sgr(c) => self.get_color(*c),
            ColorCode::Palette(n) => self.slots[*n as usize],
            ColorCode::TrueColor(rgb) => *rgb,
        }
    }

    /// Resolves a foreground color with bold/faint emulation applied.
    ///
    /// Base SGR colors switch to their bright or faint slots; palette and
    /// literal colors are brightened by 50% or darkened by 15%.
    pub fn foreground(&self, code: &ColorCode, bold: bool, faint: bool) -> Rgb {
        match *code {
            ColorCode::Sgr(c) if bold => match c {
                30..=37 => self.slots[(c - 30 + 8) as usize],
                0..=7 => self.slots[(c + 8) as usize],
                -1 | 39 => self.slots[DEFAULT_BRIGHT_FORE_SLOT],
                _ => self.get_color(c),
            },
            ColorCode::Sgr(c) if faint => match c {
                30..=37 => self.slots[FAINT_SLOT + (c - 30) as usize],
                0..=7 => self.slots[FAINT_SLOT + c as usize],
                90..=97 => self.slots[(c - 90) as usize],
                _ => self.get_color(c).decrease(0.15),
            },
            _ => {
                let rgb = self.resolve(code);
                if bold {
                    rgb.increase(0.5)
                } else if faint {
                    rgb.decrease(0.15)
                } else {
                    rgb
                }
            }
        }
    }
}

/// HTML color names, sorted for binary search.
static NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("bisque", 0xFFE4C4),
    ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("cornsilk", 0xFFF8DC),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B),
    ("darkolivegreen", 0x556B2F),
    ("darkorange", 0xFF8C00),
    ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000),
    ("darksalmon", 0xE9967A),
    ("darkseagreen", 0x8FBC8F),
    ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F),
    ("darkslategrey", 0x2F4F4F),
    ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("honeydew", 0xF0FFF0),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lavenderblush", 0xFFF0F5),
    ("lawngreen", 0x7CFC00),
    ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightsalmon", 0xFFA07A),
    ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD),
    ("mediumorchid", 0xBA55D3),
    ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371),
    ("mediumslateblue", 0x7B68EE),
    ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC),
    ("mediumvioletred", 0xC71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA),
    ("mistyrose", 0xFFE4E1),
    ("moccasin", 0xFFE4B5),
    ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080),
    ("oldlace", 0xFDF5E6),
    ("olive", 0x808000),
    ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98),
    ("paleturquoise", 0xAFEEEE),
    ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5),
    ("peachpuff", 0xFFDAB9),
    ("peru", 0xCD853F),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("powderblue", 0xB0E0E6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("rosybrown", 0xBC8F8F),
    ("royalblue", 0x4169E1),
    ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072),
    ("sandybrown", 0xF4A460),
    ("seagreen", 0x2E8B57),
    ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xFFFAFA),
    ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];
