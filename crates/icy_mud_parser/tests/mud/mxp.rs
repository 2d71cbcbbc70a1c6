use super::*;
use icy_mud_parser::{FontStyle, FormatKind, GaugeValue, ParserOptions, Rgb};
use pretty_assertions::assert_eq;

fn sends(line: &ParsedLine) -> Vec<String> {
    line.formats
        .iter()
        .filter_map(|f| match &f.kind {
            FormatKind::MxpSend(link) => Some(link.href.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_markup_needs_line_mode() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "<B>x</B> &amp;\n");
    assert_eq!(sink.texts(), vec!["<B>x</B> &amp;"]);
}

#[test]
fn test_open_line_allows_styles() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<B>bold</B> plain\n");
    let line = sink.last();
    assert_eq!(line.text, "bold plain");
    assert_eq!(line.formats.len(), 2);
    assert!(line.formats[0].style().is_some_and(|s| s.style.contains(FontStyle::BOLD)));
    assert_eq!(line.formats[1].offset, 4);
    assert!(line.formats[1].style().is_some_and(|s| !s.style.contains(FontStyle::BOLD)));
}

#[test]
fn test_open_line_ignores_secure_tags() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<SEND>go</SEND> <IMAGE map.gif>\n");
    let line = sink.last();
    assert_eq!(line.text, "go ");
    assert!(sends(line).is_empty());
    assert!(!line.formats.iter().any(|f| matches!(f.kind, FormatKind::Image(_))));
    assert!(sink.errors.is_empty());
}

#[test]
fn test_temp_secure_covers_one_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[4z<SEND>go</SEND>\nnext <SEND>x</SEND>\n");
    let lines = sink.finished();
    assert_eq!(sends(lines[0]), vec!["go"]);
    assert_eq!(lines[0].text, "go");
    assert_eq!(lines[1].text, "next <SEND>x</SEND>");
    assert!(sends(lines[1]).is_empty());
    assert_eq!(parser.line_security().line_type, LineType::OPEN);
}

#[test]
fn test_temp_secure_needs_tag_first() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[4zx<SEND>go</SEND>\n");
    assert_eq!(sink.last().text, "x<SEND>go</SEND>");
}

#[test]
fn test_lock_secure_persists() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[6z<SEND>a</SEND>\n<SEND href=b>b</SEND>\n");
    let lines = sink.finished();
    assert_eq!(sends(lines[0]), vec!["a"]);
    assert_eq!(sends(lines[1]), vec!["b"]);
    assert_eq!(parser.line_security().line_type, LineType::LOCK_SECURE);
}

#[test]
fn test_locked_line_is_literal() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[2z<B>x</B>\n");
    assert_eq!(sink.last().text, "<B>x</B>");
}

#[test]
fn test_invalid_tags_shown_on_request() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<FOO bar>x\n");
    assert_eq!(sink.last().text, "x");

    let mut parser = MudParser::new(ParserOptions {
        show_invalid_mxp_tags: true,
        ..Default::default()
    });
    let sink = feed(&mut parser, "\x1b[0z<FOO bar>x\n");
    assert_eq!(sink.last().text, "<FOO bar>x");
}

#[test]
fn test_standard_entities() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z&lt;b&gt; &amp; &#65;&#x42;\n\x1b[0z&bogus;\n");
    assert_eq!(sink.texts(), vec!["<b> & AB", "&bogus;"]);
}

#[test]
fn test_comment_is_dropped() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1zbefore<!-- hidden > still -->after\n");
    assert_eq!(sink.last().text, "beforeafter");
}

#[test]
fn test_broken_tag_is_replayed() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1za<B\nb\n");
    assert_eq!(sink.texts(), vec!["a<B", "b"]);
    assert!(matches!(sink.errors[0], ParseError::MalformedSequence { .. }));
}

#[test]
fn test_br_and_hr() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[6zone<BR>two<HR>three\n");
    assert_eq!(sink.texts(), vec!["one", "two", "", "three"]);
    let rule = sink.finished()[2];
    assert!(rule.formats.iter().any(|f| f.style().is_some_and(|s| s.hr)));
}

#[test]
fn test_nobr_joins_lines() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1zone<NOBR>\ntwo\n");
    assert_eq!(sink.texts(), vec!["onetwo"]);
}

#[test]
fn test_tag_end_event() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[10zRoom Name\nplain\n");
    assert_eq!(sink.tag_ends, vec![(LineType::ROOM_NAME, "Room Name".to_string())]);
}

#[test]
fn test_version_and_support_replies() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<VERSION>\x1b[1z<SUPPORT image.url foo>\x1b[1z<VERSION 2.1>\n");
    assert_eq!(sink.replies[0], ("VERSION".to_string(), Vec::new()));
    assert_eq!(sink.replies[1], ("SUPPORT".to_string(), vec!["+image.url".to_string(), "-FOO".to_string()]));
    assert_eq!(parser.style_version(), Some("2.1"));
}

#[test]
fn test_color_tag() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<C red black>R</C>\n");
    let style = sink.last().formats[0].style().cloned().expect("style");
    assert_eq!(Some(style.fore), Rgb::parse("red"));
    assert_eq!(Some(style.back), Rgb::parse("black"));
}

#[test]
fn test_invalid_color_is_reported() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<C nocolor>x</C>\n");
    assert_eq!(sink.last().text, "x");
    assert!(matches!(&sink.errors[0], ParseError::InvalidAttributeValue { value, .. } if value == "nocolor"));
}

#[test]
fn test_unbalanced_close_is_reported() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z</B>x\n");
    assert_eq!(sink.errors, vec![ParseError::UnbalancedMarkup { tag: "B".to_string() }]);
}

#[test]
fn test_close_pops_inner_frames() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<B><I>x</B>y\n");
    let line = sink.last();
    assert_eq!(line.text, "xy");
    let last = line.formats.last().and_then(|f| f.style()).expect("style");
    assert!(!last.style.intersects(FontStyle::BOLD | FontStyle::ITALIC));
}

#[test]
fn test_send_text_and_menu() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<SEND>north</SEND> <SEND \"get sword|drop sword\" \"Sword|Get|Drop\">sword</SEND>\n");
    let links: Vec<_> = sink.last().formats.iter().filter_map(|f| f.kind.link()).cloned().collect();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].href, "north");
    assert_eq!(links[0].hint, "north");
    assert_eq!(links[1].commands, vec!["get sword", "drop sword"]);
    assert_eq!(links[1].hint, "Sword");
    assert_eq!(links[1].tooltip, vec!["Get", "Drop"]);
}

#[test]
fn test_links_disabled() {
    let mut parser = MudParser::new(ParserOptions {
        enable_links: false,
        ..Default::default()
    });
    let sink = feed(&mut parser, "\x1b[1z<A href=\"http://x.org\">site</A>\n");
    assert_eq!(sink.last().text, "site");
    assert!(sink.last().formats.iter().all(|f| matches!(f.kind, FormatKind::Normal(_))));
}

#[test]
fn test_link_spans_lines() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[6z<A href=\"http://x.org\">one<BR>two</A>\n");
    let lines = sink.finished();
    assert!(matches!(lines[0].formats.last().map(|f| &f.kind), Some(FormatKind::MxpLinkEnd)));
    assert!(lines[1].formats.iter().any(|f| matches!(&f.kind, FormatKind::MxpLink(link) if link.href == "http://x.org")));
}

#[test]
fn test_image_on_secure_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<IMAGE foo.gif URL=\"http://x/\" ALIGN=Top>\n");
    let image = sink
        .last()
        .formats
        .iter()
        .find_map(|f| match &f.kind {
            FormatKind::Image(image) => Some(image.clone()),
            _ => None,
        })
        .expect("image");
    assert_eq!(image.name, "foo.gif");
    assert_eq!(image.url, "http://x/");
    assert_eq!(image.align, "top");
}

#[test]
fn test_var_defines_entity() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<VAR hp>42</VAR>\n");
    assert_eq!(sink.last().text, "42");
    assert_eq!(parser.public_entity("hp"), Some("42"));
    assert!(sink.errors.is_empty());
}

#[test]
fn test_gauge_reads_entities() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ENTITY hp 50><!ENTITY maxhp 100><GAUGE hp maxhp Health red><STAT hp maxhp>\n");
    assert_eq!(sink.gauges.len(), 1);
    let gauge = &sink.gauges[0];
    assert_eq!(gauge.entity, "hp");
    assert_eq!(gauge.value, GaugeValue::Number(50.0));
    assert_eq!(gauge.max, GaugeValue::Number(100.0));
    assert_eq!(gauge.caption, "Health");
    assert_eq!(gauge.color, Rgb::parse("red"));
    assert_eq!(sink.stats.len(), 1);
}

#[test]
fn test_reset_mode_forgets_server_definitions() {
    let mut parser = MudParser::default();
    feed(&mut parser, "\x1b[1z<!ENTITY hp 5>\n");
    assert_eq!(parser.public_entity("hp"), Some("5"));
    feed(&mut parser, "\x1b[3z\n");
    assert_eq!(parser.public_entity("hp"), None);
}

#[test]
fn test_reset_tag_forgets_server_definitions() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ENTITY hp 5><RESET>&hp;\n");
    assert_eq!(sink.last().text, "&hp;");
    assert_eq!(parser.public_entity("hp"), None);
    assert_eq!(parser.line_security().line_type, LineType::OPEN);
    assert_eq!(parser.line_security().default_mode, LineType::OPEN);
}

#[test]
fn test_empty_links_leave_no_fragments() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<SEND go></SEND>x\n\x1b[1z<A http://x.org></A>y\n");
    for line in sink.finished() {
        assert_eq!(line.formats.len(), 1);
        assert_eq!(line.formats[0].offset, 0);
        assert!(matches!(line.formats[0].kind, FormatKind::Normal(_)));
    }
    assert_eq!(sink.texts(), vec!["x", "y"]);
}

#[test]
fn test_mxp_disabled() {
    let mut parser = MudParser::new(ParserOptions {
        enable_mxp: false,
        ..Default::default()
    });
    let sink = feed(&mut parser, "\x1b[1z<B>x</B>\n");
    assert_eq!(sink.last().text, "<B>x</B>");
}
