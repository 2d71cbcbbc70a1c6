//! MXP vocabulary: the built-in tag table, argument helpers and the
//! `SUPPORT` reply.

mod entities;
pub use entities::{decode_entity, escape_markup};

use std::collections::HashMap;

/// Built-in MXP tags. Aliases (`BOLD`, `STRONG`, `EM`, ...) map onto one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MxpTag {
    Bold,
    Italic,
    Underline,
    Strikeout,
    Color,
    High,
    Font,
    Heading(u8),
    Link,
    Send,
    Paragraph,
    Var,
    NoBr,
    Br,
    Sbr,
    Hr,
    Image,
    Expire,
    Version,
    Support,
    Reset,
    User,
    Password,
    Gauge,
    Stat,
    Sound,
    Music,
    Element,
    Entity,
    AttList,
    Tag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Pushes a style frame that a matching close tag pops again.
    Stacking,
    /// One-shot side effect, never touches the style stack.
    Declarative,
}

lazy_static::lazy_static! {
    static ref TAG_TABLE: HashMap<&'static str, MxpTag> = {
        let mut m = HashMap::new();
        m.insert("B", MxpTag::Bold);
        m.insert("BOLD", MxpTag::Bold);
        m.insert("STRONG", MxpTag::Bold);
        m.insert("I", MxpTag::Italic);
        m.insert("ITALIC", MxpTag::Italic);
        m.insert("EM", MxpTag::Italic);
        m.insert("U", MxpTag::Underline);
        m.insert("UNDERLINE", MxpTag::Underline);
        m.insert("S", MxpTag::Strikeout);
        m.insert("STRIKEOUT", MxpTag::Strikeout);
        m.insert("STRIKE", MxpTag::Strikeout);
        m.insert("C", MxpTag::Color);
        m.insert("COLOR", MxpTag::Color);
        m.insert("H", MxpTag::High);
        m.insert("HIGH", MxpTag::High);
        m.insert("FONT", MxpTag::Font);
        m.insert("H1", MxpTag::Heading(1));
        m.insert("H2", MxpTag::Heading(2));
        m.insert("H3", MxpTag::Heading(3));
        m.insert("H4", MxpTag::Heading(4));
        m.insert("H5", MxpTag::Heading(5));
        m.insert("H6", MxpTag::Heading(6));
        m.insert("A", MxpTag::Link);
        m.insert("SEND", MxpTag::Send);
        m.insert("P", MxpTag::Paragraph);
        m.insert("V", MxpTag::Var);
        m.insert("VAR", MxpTag::Var);
        m.insert("NOBR", MxpTag::NoBr);
        m.insert("BR", MxpTag::Br);
        m.insert("SBR", MxpTag::Sbr);
        m.insert("HR", MxpTag::Hr);
        m.insert("IMAGE", MxpTag::Image);
        m.insert("EXPIRE", MxpTag::Expire);
        m.insert("VERSION", MxpTag::Version);
        m.insert("SUPPORT", MxpTag::Support);
        m.insert("RESET", MxpTag::Reset);
        m.insert("USER", MxpTag::User);
        m.insert("PASSWORD", MxpTag::Password);
        m.insert("GAUGE", MxpTag::Gauge);
        m.insert("STAT", MxpTag::Stat);
        m.insert("SOUND", MxpTag::Sound);
        m.insert("MUSIC", MxpTag::Music);
        m.insert("!ELEMENT", MxpTag::Element);
        m.insert("!EL", MxpTag::Element);
        m.insert("!ENTITY", MxpTag::Entity);
        m.insert("!EN", MxpTag::Entity);
        m.insert("!ATTLIST", MxpTag::AttList);
        m.insert("!AT", MxpTag::AttList);
        m.insert("!TAG", MxpTag::Tag);
        m
    };
}

impl MxpTag {
    /// Looks up a tag name, case insensitive.
    pub fn lookup(name: &str) -> Option<MxpTag> {
        TAG_TABLE.get(name.to_ascii_uppercase().as_str()).copied()
    }

    pub fn class(&self) -> TagClass {
        match self {
            MxpTag::Bold
            | MxpTag::Italic
            | MxpTag::Underline
            | MxpTag::Strikeout
            | MxpTag::Color
            | MxpTag::High
            | MxpTag::Font
            | MxpTag::Heading(_)
            | MxpTag::Link
            | MxpTag::Send
            | MxpTag::Paragraph
            | MxpTag::Var => TagClass::Stacking,
            _ => TagClass::Declarative,
        }
    }

    /// Tags with side effects beyond text styling need a Secure-family line.
    pub fn needs_secure(&self) -> bool {
        !matches!(
            self,
            MxpTag::Bold | MxpTag::Italic | MxpTag::Underline | MxpTag::Strikeout | MxpTag::Color | MxpTag::High | MxpTag::Font
        )
    }
}

/// Splits a tag body on whitespace, keeping quoted runs (quotes included) together.
pub fn split_args(body: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in body.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Removes one pair of matching outer quotes.
pub fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// One tag argument: `name=value` or a bare positional value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagArg<'a> {
    Named(&'a str, &'a str),
    Positional(&'a str),
}

impl<'a> TagArg<'a> {
    pub fn parse(arg: &'a str) -> Self {
        if arg.starts_with('"') || arg.starts_with('\'') {
            return TagArg::Positional(strip_quotes(arg));
        }
        match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => TagArg::Named(name, strip_quotes(value)),
            _ => TagArg::Positional(strip_quotes(arg)),
        }
    }

    /// Upper cased name for named arguments, upper cased value for bare keywords.
    pub fn keyword(&self) -> String {
        match self {
            TagArg::Named(name, _) => name.to_ascii_uppercase(),
            TagArg::Positional(value) => value.to_ascii_uppercase(),
        }
    }
}

/// Builds the close markup for a definition: `<B><C red>` gives `</C></B>`.
pub fn close_tags_for(definition: &str) -> String {
    let mut names = Vec::new();
    let mut chars = definition.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '<' {
            continue;
        }
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '>' || c == '<' {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() || name.starts_with('/') || name.starts_with('!') {
            continue;
        }
        names.push(name);
    }
    names.iter().rev().map(|n| format!("</{n}>")).collect()
}

/// Replaces `&name;` placeholders of declared attributes.
pub fn substitute_attributes(template: &str, values: &[(String, String)]) -> String {
    let mut result = template.to_string();
    for (name, value) in values {
        let placeholder = format!("&{name};");
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, value);
        }
    }
    result
}

const SUPPORTED: &[(&str, &[&str])] = &[
    ("A", &["href", "hint", "expire"]),
    ("SEND", &["href", "hint", "prompt", "expire"]),
    ("B", &[]),
    ("I", &[]),
    ("COLOR", &["fore", "back"]),
    ("C", &["fore", "back"]),
    ("EM", &[]),
    ("ITALIC", &[]),
    ("STRONG", &[]),
    ("BOLD", &[]),
    ("UNDERLINE", &[]),
    ("U", &[]),
    ("S", &[]),
    ("STRIKEOUT", &[]),
    ("STRIKE", &[]),
    ("H", &[]),
    ("HIGH", &[]),
    ("FONT", &["face", "size", "color", "back"]),
    ("EXPIRE", &["name"]),
    ("VERSION", &[]),
    ("SUPPORT", &[]),
    ("NOBR", &[]),
    ("P", &[]),
    ("BR", &[]),
    ("SBR", &[]),
    ("HR", &[]),
    ("VAR", &["name", "desc", "private", "publish", "delete", "add", "remove"]),
    ("SOUND", &["fname", "v", "l", "p", "t", "u"]),
    ("MUSIC", &["fname", "v", "l", "c", "t", "u"]),
    ("USER", &[]),
    ("PASSWORD", &[]),
    ("RESET", &[]),
    ("H1", &[]),
    ("H2", &[]),
    ("H3", &[]),
    ("H4", &[]),
    ("H5", &[]),
    ("H6", &[]),
    ("IMAGE", &["fname", "url", "t", "h", "w", "hspace", "vspace", "align", "ismap"]),
    ("STAT", &["max", "caption"]),
    ("GAUGE", &["max", "caption", "color"]),
];

/// Answers `<SUPPORT args>`. Without arguments every supported tag is listed.
pub fn support_reply(args: &[String]) -> Vec<String> {
    if args.is_empty() {
        return SUPPORTED.iter().map(|(tag, _)| format!("+{tag}")).collect();
    }
    let mut reply = Vec::new();
    for arg in args {
        let arg = strip_quotes(arg);
        let (tag, attr) = match arg.split_once('.') {
            Some((tag, attr)) => (tag.to_ascii_uppercase(), Some(attr.to_ascii_lowercase())),
            None => (arg.to_ascii_uppercase(), None),
        };
        let entry = SUPPORTED.iter().find(|(name, _)| *name == tag);
        match (entry, attr) {
            (None, None) => reply.push(format!("-{tag}")),
            (None, Some(attr)) => reply.push(format!("-{}.{attr}", tag.to_ascii_lowercase())),
            (Some(_), None) => reply.push(format!("+{tag}")),
            (Some((name, attrs)), Some(attr)) if attr == "*" => {
                for a in attrs.iter() {
                    reply.push(format!("+{}.{a}", name.to_ascii_lowercase()));
                }
            }
            (Some((name, attrs)), Some(attr)) => {
                let sign = if attrs.contains(&attr.as_str()) { '+' } else { '-' };
                reply.push(format!("{sign}{}.{attr}", name.to_ascii_lowercase()));
            }
        }
    }
    reply
}
