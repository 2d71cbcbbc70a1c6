//! Sound and music requests, shared by the MSP `!!SOUND(..)` triggers and
//! the MXP `<SOUND>` / `<MUSIC>` tags.

use crate::mxp::TagArg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Sound,
    Music,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRequest {
    pub kind: SoundKind,
    /// `Off` was given instead of a file name: stop playback.
    pub off: bool,
    pub file: String,
    /// Base URL to download the file from, always ending with `/`.
    pub url: Option<String>,
    /// 0-100
    pub volume: u8,
    /// Number of repeats, -1 loops forever.
    pub repeat: i32,
    /// Sound only, 0-100.
    pub priority: u8,
    /// Music only: keep playing if the same file is requested again.
    pub continue_playing: bool,
    pub sound_type: Option<String>,
}

impl SoundRequest {
    pub fn new(kind: SoundKind) -> Self {
        Self {
            kind,
            off: false,
            file: String::new(),
            url: None,
            volume: 100,
            repeat: 1,
            priority: 50,
            continue_playing: true,
            sound_type: None,
        }
    }

    /// Parses `fname V=.. L=.. P=../C=.. T=.. U=..`; positional values follow the same order.
    pub fn from_args(kind: SoundKind, args: &[String]) -> Self {
        let mut request = SoundRequest::new(kind);
        for (index, arg) in args.iter().enumerate() {
            let (key, value) = match TagArg::parse(arg) {
                TagArg::Named(name, value) => (name.to_ascii_uppercase(), value),
                TagArg::Positional(value) => {
                    let key = match (index, kind) {
                        (0, _) => "FNAME",
                        (1, _) => "V",
                        (2, _) => "L",
                        (3, SoundKind::Sound) => "P",
                        (3, SoundKind::Music) => "C",
                        (4, _) => "T",
                        (5, _) => "U",
                        _ => continue,
                    };
                    (key.to_string(), value)
                }
            };
            match key.as_str() {
                "FNAME" => {
                    if value.eq_ignore_ascii_case("off") {
                        request.off = true;
                    } else {
                        request.file = value.to_string();
                    }
                }
                "V" => {
                    if let Ok(v) = value.parse::<i32>() {
                        request.volume = v.clamp(0, 100) as u8;
                    }
                }
                "L" => {
                    if let Ok(v) = value.parse::<i32>() {
                        request.repeat = if v < 0 { -1 } else { v };
                    }
                }
                "P" => {
                    if let Ok(v) = value.parse::<i32>() {
                        request.priority = v.clamp(0, 100) as u8;
                    }
                }
                "C" => request.continue_playing = value != "0",
                "T" => request.sound_type = Some(value.to_string()),
                "U" => {
                    let mut url = value.to_string();
                    if !url.is_empty() && !url.ends_with('/') {
                        url.push('/');
                    }
                    request.url = Some(url);
                }
                _ => log::debug!("ignoring sound argument {key}"),
            }
        }
        request
    }

    /// Full location of the file when a base URL is known.
    pub fn location(&self) -> String {
        match &self.url {
            Some(url) => format!("{url}{}", self.file),
            None => self.file.clone(),
        }
    }
}
