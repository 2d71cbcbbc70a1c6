//! MXP tag semantics: style frames, links, declarations and custom elements.

use crate::mxp::{MxpTag, TagArg, TagClass, close_tags_for, escape_markup, split_args, strip_quotes, substitute_attributes, support_reply};
use crate::{
    Element, Entity, FontStyle, FormatKind, FrameTag, FramePayload, Gauge, GaugeValue, ImageFormat, LineTag, LinkFormat, Origin, ParseError,
    ParserSink, RegistryEntry, Rgb, SoundKind, SoundRequest, Stat, StyleFrame,
};

use super::MudParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityOp {
    Set,
    Delete,
    Add,
    Remove,
}

/// Parsed `<!ENTITY>` or `</VAR>` arguments.
#[derive(Debug)]
struct EntityUpdate {
    name: String,
    value: String,
    description: String,
    publish: bool,
    op: EntityOp,
}

impl EntityUpdate {
    /// `fields` gives the meaning of the positional arguments in order.
    fn parse(args: &[String], fields: &[&str]) -> Self {
        let mut update = EntityUpdate {
            name: String::new(),
            value: String::new(),
            description: String::new(),
            publish: true,
            op: EntityOp::Set,
        };
        let mut positional = 0;
        for arg in args {
            match TagArg::parse(arg) {
                TagArg::Named(name, value) => match name.to_ascii_uppercase().as_str() {
                    "NAME" => update.name = value.to_string(),
                    "DESC" => update.description = value.to_string(),
                    _ => {}
                },
                TagArg::Positional(value) => {
                    let keyword = if is_quoted(arg) { String::new() } else { value.to_ascii_uppercase() };
                    match keyword.as_str() {
                        "PRIVATE" => update.publish = false,
                        "PUBLISH" => update.publish = true,
                        "DELETE" => update.op = EntityOp::Delete,
                        "ADD" => update.op = EntityOp::Add,
                        "REMOVE" => update.op = EntityOp::Remove,
                        _ => {
                            match fields.get(positional) {
                                Some(&"name") => update.name = value.to_string(),
                                Some(&"value") => update.value = value.to_string(),
                                Some(&"desc") => update.description = value.to_string(),
                                _ => {}
                            }
                            positional += 1;
                        }
                    }
                }
            }
        }
        update
    }
}

fn is_quoted(arg: &str) -> bool {
    arg.starts_with(['"', '\''])
}

/// `<A>` arguments: href, hint, expire.
fn link_args(args: &[String]) -> LinkFormat {
    let mut link = LinkFormat::default();
    let mut hint = None;
    for (x, arg) in args.iter().enumerate() {
        let (key, value) = match TagArg::parse(arg) {
            TagArg::Named(name, value) => (name.to_ascii_uppercase(), value),
            TagArg::Positional(value) => match x {
                0 => ("HREF".to_string(), value),
                1 => ("HINT".to_string(), value),
                2 => ("EXPIRE".to_string(), value),
                _ => continue,
            },
        };
        match key.as_str() {
            "HREF" => link.href = value.to_string(),
            "HINT" => hint = Some(value.to_string()),
            "EXPIRE" => link.expire = Some(value.to_string()).filter(|v| !v.is_empty()),
            _ => {}
        }
    }
    link.hint = hint.unwrap_or_else(|| link.href.clone());
    link.commands = vec![link.href.clone()];
    link
}

/// `<SEND>` arguments. `href` may list several commands separated by `|`; a
/// hint with one more part than there are commands carries the menu captions.
fn send_args(args: &[String]) -> LinkFormat {
    let mut href = None;
    let mut hint = None;
    let mut expire = None;
    let mut prompt = false;
    let mut positional = 0;
    for arg in args {
        match TagArg::parse(arg) {
            TagArg::Named(name, value) => match name.to_ascii_uppercase().as_str() {
                "HREF" => href = Some(value.to_string()),
                "HINT" => hint = Some(value.to_string()),
                "PROMPT" => prompt = true,
                "EXPIRE" => expire = Some(value.to_string()),
                _ => {}
            },
            TagArg::Positional(value) if !is_quoted(arg) && value.eq_ignore_ascii_case("PROMPT") => prompt = true,
            TagArg::Positional(value) => {
                match positional {
                    0 => href = Some(value.to_string()),
                    1 => hint = Some(value.to_string()),
                    2 => prompt = true,
                    3 => expire = Some(value.to_string()),
                    _ => {}
                }
                positional += 1;
            }
        }
    }
    let href = href.unwrap_or_else(|| "&text;".to_string());
    let commands: Vec<String> = href.split('|').map(str::to_string).collect();
    let hint = hint.unwrap_or_else(|| href.clone());
    let parts: Vec<&str> = hint.split('|').collect();
    let (hint, tooltip) = if commands.len() > 1 && parts.len() == commands.len() + 1 {
        (parts[0].to_string(), parts[1..].iter().map(|s| s.to_string()).collect())
    } else {
        (hint.clone(), Vec::new())
    };
    LinkFormat {
        href,
        commands,
        hint,
        expire: expire.filter(|v| !v.is_empty()),
        prompt,
        tooltip,
    }
}

impl MudParser {
    /// Runs a complete tag; `body` is everything between `<` and `>`.
    pub(super) fn dispatch_tag(&mut self, body: &str, sink: &mut dyn ParserSink) -> Result<(), ParseError> {
        let trimmed = body.trim();
        let (name, rest) = match trimmed.find(char::is_whitespace) {
            Some(i) => (&trimmed[..i], trimmed[i..].trim_start()),
            None => (trimmed, ""),
        };
        if name.is_empty() {
            self.reject_tag(body, "empty tag", sink);
            return Ok(());
        }
        if let Some(closing) = name.strip_prefix('/') {
            self.close_tag(closing, body, sink);
            return Ok(());
        }
        let args = split_args(rest);
        if let Some(tag) = MxpTag::lookup(name) {
            if tag.needs_secure() && !self.security.is_secure() {
                self.reject_tag(body, &format!("<{name}> ignored on {} line", self.security.line_type), sink);
                return Ok(());
            }
            match tag.class() {
                TagClass::Stacking => self.open_frame(tag, name, &args, sink),
                TagClass::Declarative => self.declarative(tag, &args, sink),
            }
            return Ok(());
        }
        let key = name.to_ascii_uppercase();
        if self.registries.elements.contains(&key) {
            self.open_element(&key, &args, false, sink);
            return Ok(());
        }
        self.reject_tag(body, &format!("unknown tag <{name}>"), sink);
        Ok(())
    }

    fn reject_tag(&mut self, body: &str, reason: &str, sink: &mut dyn ParserSink) {
        if self.options.show_invalid_mxp_tags {
            self.put_literal(&format!("<{body}>"));
        }
        self.debug(sink, reason);
    }

    fn open_frame(&mut self, tag: MxpTag, name: &str, args: &[String], sink: &mut dyn ParserSink) {
        let mut frame = self.styles.derive(FrameTag::Builtin(tag), !tag.needs_secure());
        match tag {
            MxpTag::Bold | MxpTag::Heading(_) => frame.style.insert(FontStyle::BOLD),
            MxpTag::Italic => frame.style.insert(FontStyle::ITALIC),
            MxpTag::Underline => frame.style.insert(FontStyle::UNDERLINE),
            MxpTag::Strikeout => frame.style.insert(FontStyle::STRIKEOUT),
            MxpTag::High => frame.high = true,
            MxpTag::Color => self.color_args(&mut frame, name, args, sink),
            MxpTag::Font => self.font_args(&mut frame, args, sink),
            MxpTag::Link => {
                let link = link_args(args);
                if self.options.enable_links {
                    self.line.push_format(FormatKind::MxpLink(link.clone()));
                }
                frame.payload = FramePayload::Link(link);
            }
            MxpTag::Send => {
                let link = send_args(args);
                if self.options.enable_links {
                    self.line.push_format(FormatKind::MxpSend(link.clone()));
                }
                frame.payload = FramePayload::Send(link);
            }
            MxpTag::Paragraph => self.security.paragraph = true,
            MxpTag::Var => {
                frame.payload = FramePayload::Var(args.to_vec());
                self.security.push_capture();
            }
            _ => {}
        }
        self.styles.push(frame);
        self.push_style_block();
    }

    fn color_args(&mut self, frame: &mut StyleFrame, name: &str, args: &[String], sink: &mut dyn ParserSink) {
        let mut positional = 0;
        for arg in args {
            let (field, value) = match TagArg::parse(arg) {
                TagArg::Named(field, value) => (field.to_ascii_uppercase(), value),
                TagArg::Positional(value) => {
                    positional += 1;
                    match positional {
                        1 => ("FORE".to_string(), value),
                        2 => ("BACK".to_string(), value),
                        _ => continue,
                    }
                }
            };
            let slot = match field.as_str() {
                "FORE" => &mut frame.fore,
                "BACK" => &mut frame.back,
                _ => continue,
            };
            match Rgb::parse(value) {
                Some(rgb) => *slot = Some(rgb),
                None => self.report(sink, ParseError::invalid_value(name, &field, value)),
            }
        }
    }

    fn font_args(&mut self, frame: &mut StyleFrame, args: &[String], sink: &mut dyn ParserSink) {
        for (x, arg) in args.iter().enumerate() {
            let (field, value) = match TagArg::parse(arg) {
                TagArg::Named(field, value) => (field.to_ascii_uppercase(), value),
                TagArg::Positional(value) => match x {
                    0 => ("FACE".to_string(), value),
                    1 => ("SIZE".to_string(), value),
                    2 => ("COLOR".to_string(), value),
                    3 => ("BACK".to_string(), value),
                    _ => continue,
                },
            };
            match field.as_str() {
                "FACE" => frame.font = Some(value.to_string()),
                "SIZE" if value.parse::<f64>().is_ok() => frame.size = Some(format!("{value}pt")),
                "SIZE" => frame.size = Some(value.to_string()),
                "COLOR" => {
                    for word in value.split(',').map(str::trim).filter(|w| !w.is_empty()) {
                        match word.to_ascii_lowercase().as_str() {
                            "bold" => frame.style.insert(FontStyle::BOLD),
                            "italic" => frame.style.insert(FontStyle::ITALIC),
                            "underline" => frame.style.insert(FontStyle::UNDERLINE),
                            "blink" => frame.style.insert(FontStyle::SLOW_BLINK),
                            "strikeout" => frame.style.insert(FontStyle::STRIKEOUT),
                            _ => match Rgb::parse(word) {
                                Some(rgb) => frame.fore = Some(rgb),
                                None => self.report(sink, ParseError::invalid_value("FONT", "COLOR", word)),
                            },
                        }
                    }
                }
                "BACK" => match Rgb::parse(value) {
                    Some(rgb) => frame.back = Some(rgb),
                    None => self.report(sink, ParseError::invalid_value("FONT", "BACK", value)),
                },
                _ => {}
            }
        }
    }

    fn close_tag(&mut self, name: &str, body: &str, sink: &mut dyn ParserSink) {
        let key = name.trim().to_ascii_uppercase();
        if let Some(tag) = MxpTag::lookup(&key) {
            if tag.class() == TagClass::Declarative {
                self.debug(sink, &format!("ignoring close of <{key}>"));
                return;
            }
            if tag.needs_secure() && !self.security.is_secure() {
                self.reject_tag(body, &format!("</{key}> ignored on {} line", self.security.line_type), sink);
                return;
            }
            let closed = self.styles.close(&FrameTag::Builtin(tag), self.security.is_secure());
            let matched = closed.matched.is_some();
            for frame in closed.implicit.into_iter().chain(closed.matched) {
                self.end_frame(frame, sink);
            }
            if !matched {
                self.report(sink, ParseError::UnbalancedMarkup { tag: key });
            }
            self.push_style_block();
            return;
        }
        if self.registries.elements.get(&key).is_some_and(|e| !e.empty) {
            self.close_element(&key, false, sink);
            return;
        }
        self.reject_tag(body, &format!("unknown close tag </{name}>"), sink);
    }

    /// Side effects of a frame leaving the stack.
    fn end_frame(&mut self, frame: StyleFrame, sink: &mut dyn ParserSink) {
        match frame.payload {
            FramePayload::Link(_) => {
                if self.options.enable_links {
                    self.line.push_format(FormatKind::MxpLinkEnd);
                }
            }
            FramePayload::Send(link) => {
                if link.href.contains("&text;") || link.hint.contains("&text;") {
                    self.fill_send_text();
                }
                if self.options.enable_links {
                    self.line.push_format(FormatKind::MxpSendEnd);
                }
            }
            FramePayload::Var(args) => self.close_var(&args, sink),
            FramePayload::None => {}
        }
        if frame.tag == FrameTag::Builtin(MxpTag::Paragraph) {
            self.security.paragraph = false;
        }
    }

    /// Replaces `&text;` in the innermost send with the text it enclosed.
    fn fill_send_text(&mut self) {
        let Some(index) = self.line.formats.iter().rposition(|f| matches!(f.kind, FormatKind::MxpSend(_))) else {
            return;
        };
        let start = self.line.formats[index].offset;
        let text: String = self.line.text.chars().skip(start).collect();
        if let FormatKind::MxpSend(link) = &mut self.line.formats[index].kind {
            link.href = link.href.replace("&text;", &text);
            link.hint = link.hint.replace("&text;", &text);
            for command in &mut link.commands {
                *command = command.replace("&text;", &text);
            }
        }
    }

    fn close_var(&mut self, args: &[String], sink: &mut dyn ParserSink) {
        let captured = self.security.pop_capture().unwrap_or_default();
        let mut update = EntityUpdate::parse(args, &["name", "desc"]);
        if update.name.is_empty() {
            self.report(sink, ParseError::invalid_value("VAR", "name", ""));
            return;
        }
        let mut value = String::new();
        for ch in captured.chars() {
            escape_markup(ch, &mut value);
        }
        update.value = value;
        self.store_entity(update, sink);
    }

    fn store_entity(&mut self, update: EntityUpdate, sink: &mut dyn ParserSink) {
        let origin = Origin::from_remote(self.remote);
        let entities = &mut self.registries.entities;
        match update.op {
            EntityOp::Delete => {
                entities.remove(&update.name, origin);
                return;
            }
            EntityOp::Add | EntityOp::Remove => {
                if let Some(entity) = entities.get_mut(&update.name).filter(|e| e.replaceable_by(origin)) {
                    if update.op == EntityOp::Add {
                        if !entity.value.is_empty() {
                            entity.value.push('|');
                        }
                        entity.value.push_str(&update.value);
                    } else {
                        entity.value = entity.value.split('|').filter(|v| *v != update.value).collect::<Vec<_>>().join("|");
                    }
                    return;
                }
                if update.op == EntityOp::Remove {
                    return;
                }
            }
            EntityOp::Set => {}
        }
        let name = update.name.clone();
        let entity = Entity {
            name: update.name,
            value: update.value,
            description: update.description,
            publish: update.publish,
            origin,
        };
        if !entities.define(name.clone(), entity) {
            self.debug(sink, &format!("rejected redefinition of &{name};"));
        }
    }

    fn declarative(&mut self, tag: MxpTag, args: &[String], sink: &mut dyn ParserSink) {
        match tag {
            MxpTag::Br => self.break_line(sink),
            MxpTag::Sbr => self.put_literal(" \u{200B}"),
            MxpTag::NoBr => self.security.no_break = true,
            MxpTag::Hr => {
                if self.line.len > 0 {
                    self.break_line(sink);
                }
                self.push_hr();
                self.break_line(sink);
            }
            MxpTag::Image => self.image(args),
            MxpTag::Expire => self.expire(args, sink),
            MxpTag::Version => match args.first() {
                Some(version) => self.style_version = Some(strip_quotes(version).to_string()),
                None => sink.tag_reply("VERSION", &[]),
            },
            MxpTag::Support => sink.tag_reply("SUPPORT", &support_reply(args)),
            MxpTag::Reset => self.reset_all_mxp(),
            MxpTag::User => sink.tag_reply("USER", args),
            MxpTag::Password => sink.tag_reply("PASSWORD", args),
            MxpTag::Gauge | MxpTag::Stat => self.gauge(tag, args, sink),
            MxpTag::Sound => sink.sound(&SoundRequest::from_args(SoundKind::Sound, args)),
            MxpTag::Music => sink.music(&SoundRequest::from_args(SoundKind::Music, args)),
            MxpTag::Element => self.define_element(args, sink),
            MxpTag::AttList => self.define_attlist(args, sink),
            MxpTag::Entity => {
                let update = EntityUpdate::parse(args, &["name", "value", "desc"]);
                if update.name.is_empty() {
                    self.report(sink, ParseError::invalid_value("!ENTITY", "name", ""));
                } else {
                    self.store_entity(update, sink);
                }
            }
            MxpTag::Tag => self.define_line_tag(args, sink),
            _ => {}
        }
    }

    fn image(&mut self, args: &[String]) {
        const FIELDS: [&str; 8] = ["FNAME", "URL", "T", "H", "W", "HSPACE", "VSPACE", "ALIGN"];
        let mut image = ImageFormat {
            url: self.options.default_image_url.clone(),
            ..Default::default()
        };
        let mut positional = 0;
        for arg in args {
            let (key, value) = match TagArg::parse(arg) {
                TagArg::Named(name, value) => (name.to_ascii_uppercase(), value),
                TagArg::Positional(value) if !is_quoted(arg) && value.eq_ignore_ascii_case("ISMAP") => {
                    image.ismap = true;
                    continue;
                }
                TagArg::Positional(value) => {
                    let Some(key) = FIELDS.get(positional) else {
                        continue;
                    };
                    positional += 1;
                    (key.to_string(), value)
                }
            };
            let value = value.to_string();
            match key.as_str() {
                "FNAME" => image.name = value,
                "URL" => image.url = value,
                "T" => image.kind = value,
                "H" => image.height = Some(value),
                "W" => image.width = Some(value),
                "HSPACE" => image.hspace = Some(value),
                "VSPACE" => image.vspace = Some(value),
                "ALIGN" => image.align = value.to_ascii_lowercase(),
                "ISMAP" => image.ismap = true,
                _ => {}
            }
        }
        self.line.push_format(FormatKind::Image(image));
        self.push_style_block();
    }

    /// `<EXPIRE [name]>`: retires matching links here, in stored lines and on the stack.
    fn expire(&mut self, args: &[String], sink: &mut dyn ParserSink) {
        sink.expire_links(args);
        let key = args.first().map(|a| strip_quotes(a).to_string()).filter(|k| !k.is_empty());
        let hit = |link: &LinkFormat| key.is_none() || link.expire.as_deref() == key.as_deref();
        let targets: Vec<usize> = self
            .line
            .formats
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(&f.kind, FormatKind::MxpLink(link) | FormatKind::MxpSend(link) if hit(link)))
            .map(|(i, _)| i)
            .collect();
        for index in targets {
            crate::lines::expire_link(&mut self.line.formats, index);
        }
        for payload in self.styles.payload_mut() {
            let expired = matches!(payload, FramePayload::Link(link) | FramePayload::Send(link) if hit(link));
            if expired {
                *payload = FramePayload::None;
            }
        }
        for id in self.lines.expire(key.as_deref()) {
            if let Some(line) = self.lines.line(id) {
                sink.line_changed(id, line);
            }
        }
    }

    fn entity_value(&self, name: &str) -> String {
        self.registries.entities.get(&name.to_string()).map_or_else(|| name.to_string(), |e| e.value.clone())
    }

    /// `<GAUGE entity max caption color>` and `<STAT entity max caption>`.
    fn gauge(&mut self, tag: MxpTag, args: &[String], sink: &mut dyn ParserSink) {
        let mut fields: [String; 4] = Default::default();
        for (x, arg) in args.iter().enumerate() {
            match TagArg::parse(arg) {
                TagArg::Named(name, value) => {
                    let index = match name.to_ascii_uppercase().as_str() {
                        "ENTITY" => 0,
                        "MAX" => 1,
                        "CAPTION" => 2,
                        "COLOR" => 3,
                        _ => continue,
                    };
                    fields[index] = value.to_string();
                }
                TagArg::Positional(value) if x < fields.len() => fields[x] = value.to_string(),
                TagArg::Positional(_) => {}
            }
        }
        let [entity, max, caption, color] = fields;
        let value = GaugeValue::parse(&self.entity_value(&entity));
        let max = GaugeValue::parse(&self.entity_value(&max));
        if tag == MxpTag::Stat {
            sink.stat(&Stat { entity, value, max, caption });
            return;
        }
        let color = if color.is_empty() {
            None
        } else {
            let parsed = Rgb::parse(&color);
            if parsed.is_none() {
                self.report(sink, ParseError::invalid_value("GAUGE", "COLOR", &color));
            }
            parsed
        };
        sink.gauge(&Gauge {
            entity,
            value,
            max,
            caption,
            color,
        });
    }

    /// `<!ELEMENT name definition ATT= TAG= FLAG= OPEN DELETE EMPTY>`
    fn define_element(&mut self, args: &[String], sink: &mut dyn ParserSink) {
        let origin = Origin::from_remote(self.remote);
        let mut element = Element::new(String::new(), origin);
        let mut delete = false;
        let mut positional = 0;
        for arg in args {
            match TagArg::parse(arg) {
                TagArg::Named(name, value) => match name.to_ascii_uppercase().as_str() {
                    "ATT" => element.set_attributes(value),
                    "TAG" => element.tag = value.parse().ok(),
                    "FLAG" => element.flag = Some(value.to_string()),
                    other => self.report(sink, ParseError::invalid_value("!ELEMENT", other, value)),
                },
                TagArg::Positional(value) => {
                    let keyword = if is_quoted(arg) { String::new() } else { value.to_ascii_uppercase() };
                    match keyword.as_str() {
                        "OPEN" => element.open = true,
                        "DELETE" => delete = true,
                        "EMPTY" => element.empty = true,
                        _ => {
                            match positional {
                                0 => element.name = value.to_ascii_uppercase(),
                                1 => element.definition = value.to_string(),
                                2 => element.set_attributes(value),
                                3 => element.tag = value.parse().ok(),
                                4 => element.flag = Some(value.to_string()),
                                _ => {}
                            }
                            positional += 1;
                        }
                    }
                }
            }
        }
        if element.name.is_empty() {
            self.report(sink, ParseError::invalid_value("!ELEMENT", "name", ""));
            return;
        }
        let name = element.name.clone();
        if delete {
            self.registries.elements.remove(&name, origin);
            return;
        }
        element.close_definition = close_tags_for(&element.definition);
        if let Some(index) = element.tag.filter(|n| (20..=99).contains(n)) {
            let mut line_tag = self.registries.line_tags.get(&index).cloned().unwrap_or_else(|| LineTag::new(index, origin));
            line_tag.element = Some(name.clone());
            line_tag.origin = origin;
            self.registries.line_tags.define(index, line_tag);
        }
        if !self.registries.elements.define(name.clone(), element) {
            self.debug(sink, &format!("rejected redefinition of <{name}>"));
        }
    }

    /// `<!ATTLIST name attributes>`
    fn define_attlist(&mut self, args: &[String], sink: &mut dyn ParserSink) {
        let Some((name, rest)) = args.split_first() else {
            self.report(sink, ParseError::invalid_value("!ATTLIST", "name", ""));
            return;
        };
        let key = strip_quotes(name).to_ascii_uppercase();
        let list = rest.iter().map(|a| strip_quotes(a)).collect::<Vec<_>>().join(" ");
        let origin = Origin::from_remote(self.remote);
        match self.registries.elements.get_mut(&key) {
            Some(element) if element.replaceable_by(origin) => element.set_attributes(&list),
            Some(_) => self.debug(sink, &format!("rejected attribute change of <{key}>")),
            None => self.report(sink, ParseError::invalid_value("!ATTLIST", "name", &key)),
        }
    }

    /// `<!TAG index window fore back GAG ENABLE DISABLE>`
    fn define_line_tag(&mut self, args: &[String], sink: &mut dyn ParserSink) {
        let mut positionals = Vec::new();
        let mut named = Vec::new();
        let mut flags = Vec::new();
        for arg in args {
            match TagArg::parse(arg) {
                TagArg::Named(name, value) => named.push((name.to_ascii_uppercase(), value.to_string())),
                TagArg::Positional(value) => {
                    let keyword = value.to_ascii_uppercase();
                    if !is_quoted(arg) && matches!(keyword.as_str(), "GAG" | "ENABLE" | "DISABLE") {
                        flags.push(keyword);
                    } else {
                        positionals.push(value.to_string());
                    }
                }
            }
        }
        let first = positionals.first().cloned().unwrap_or_default();
        let Some(index) = first.parse::<u8>().ok().filter(|n| *n <= 99) else {
            self.report(sink, ParseError::invalid_value("!TAG", "index", &first));
            return;
        };
        let origin = Origin::from_remote(self.remote);
        let mut tag = self.registries.line_tags.get(&index).cloned().unwrap_or_else(|| LineTag::new(index, origin));
        tag.origin = origin;
        for (i, value) in positionals.into_iter().enumerate().skip(1) {
            match i {
                1 => tag.window = Some(value),
                2 => tag.fore = Some(value),
                3 => tag.back = Some(value),
                _ => {}
            }
        }
        for (name, value) in named {
            match name.as_str() {
                "WINDOWNAME" => tag.window = Some(value),
                "FORE" => tag.fore = Some(value),
                "BACK" => tag.back = Some(value),
                _ => {}
            }
        }
        for flag in flags {
            match flag.as_str() {
                "GAG" => tag.gag = true,
                "ENABLE" => tag.enabled = true,
                _ => tag.enabled = false,
            }
        }
        tag.update_definition();
        if !self.registries.line_tags.define(index, tag) {
            self.debug(sink, &format!("rejected redefinition of line tag {index}"));
        }
    }

    /// Bound line tag of an element, if enabled.
    fn element_line_tag(&self, element: &Element) -> Option<&LineTag> {
        let index = element.tag.filter(|n| (20..=99).contains(n))?;
        self.registries.line_tags.get(&index).filter(|t| t.enabled)
    }

    /// Expands a custom element into the input. `trusted` skips the security
    /// check for elements opened by a line tag.
    fn open_element(&mut self, key: &str, args: &[String], trusted: bool, sink: &mut dyn ParserSink) {
        let Some(element) = self.registries.elements.get(&key.to_string()).cloned() else {
            return;
        };
        if !element.open && !trusted && !self.security.is_secure() {
            self.debug(sink, &format!("<{key}> ignored on {} line", self.security.line_type));
            return;
        }
        let mut values = element.attributes.clone();
        for (x, arg) in args.iter().enumerate() {
            if let TagArg::Named(name, value) = TagArg::parse(arg) {
                if let Some(slot) = values.iter_mut().find(|(attr, _)| attr.eq_ignore_ascii_case(name)) {
                    slot.1 = value.to_string();
                    continue;
                }
            }
            if let Some(slot) = values.get_mut(x) {
                slot.1 = strip_quotes(arg).to_string();
            }
        }
        let mut text = substitute_attributes(&element.definition, &values);
        if !element.empty {
            self.security.push_capture();
        }
        if let Some(line_tag) = self.element_line_tag(&element) {
            text.insert_str(0, &line_tag.definition);
            let gag = line_tag.gag;
            self.line.gagged |= gag;
        }
        self.inject_markup(&text, key, sink);
    }

    fn close_element(&mut self, key: &str, trusted: bool, sink: &mut dyn ParserSink) {
        let Some(element) = self.registries.elements.get(&key.to_string()).cloned() else {
            return;
        };
        if !element.open && !trusted && !self.security.is_secure() {
            return;
        }
        let captured = self.security.pop_capture().unwrap_or_default();
        if let Some(flag) = element.flag.as_deref().filter(|f| !f.is_empty()) {
            if flag.len() > 4 && flag.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("set ")) {
                sink.set_variable(&flag[4..], &captured);
            }
            sink.mxp_flag(flag, &captured);
        }
        let mut text = element.close_definition.clone();
        if let Some(line_tag) = self.element_line_tag(&element) {
            text.push_str(&line_tag.close_definition);
        }
        self.inject_markup(&text, key, sink);
    }

    fn inject_markup(&mut self, text: &str, origin: &str, sink: &mut dyn ParserSink) {
        if !text.is_empty() && !self.input.inject(text, self.depth.saturating_add(1)) {
            self.report(sink, ParseError::unsupported(format!("expansion of <{origin}> nested too deep")));
        }
    }

    /// Enabled line tag for the current line type.
    pub(super) fn active_line_tag(&self) -> Option<&LineTag> {
        self.registries.line_tags.get(&self.security.line_type.0).filter(|t| t.enabled)
    }

    /// Opens the markup of the line tag selected by `ESC[<n>z`.
    pub(super) fn expand_line_tag(&mut self, sink: &mut dyn ParserSink) {
        let Some(tag) = self.active_line_tag().cloned() else {
            return;
        };
        match tag.element.filter(|name| self.registries.elements.contains(name)) {
            Some(name) => self.open_element(&name, &[], true, sink),
            None => self.inject_markup(&tag.definition, &format!("line tag {}", tag.index), sink),
        }
        self.line_tag_open = true;
    }

    /// Splices the closing markup of the current line tag in front of the newline.
    pub(super) fn close_line_tag(&mut self, sink: &mut dyn ParserSink) {
        let Some(tag) = self.active_line_tag().cloned() else {
            return;
        };
        match tag.element.filter(|name| self.registries.elements.contains(name)) {
            Some(name) => self.close_element(&name, true, sink),
            None => self.inject_markup(&tag.close_definition, &format!("line tag {}", tag.index), sink),
        }
    }
}
