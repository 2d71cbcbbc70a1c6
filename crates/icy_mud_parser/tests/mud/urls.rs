use super::*;
use icy_mud_parser::{FormatKind, ParserOptions};
use pretty_assertions::assert_eq;

/// `(start, end, href)` of every detected URL.
fn urls(line: &ParsedLine) -> Vec<(usize, usize, String)> {
    let mut result = Vec::new();
    for (i, format) in line.formats.iter().enumerate() {
        if let FormatKind::Link(link) = &format.kind {
            let end = line.formats[i + 1..]
                .iter()
                .find(|f| matches!(f.kind, FormatKind::LinkEnd))
                .map_or(line.text.chars().count(), |f| f.offset);
            result.push((format.offset, end, link.href.clone()));
        }
    }
    result
}

#[test]
fn test_balanced_parentheses() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "see http://example.com/a(b)) now\n");
    let line = sink.last();
    assert_eq!(line.text, "see http://example.com/a(b)) now");
    assert_eq!(urls(line), vec![(4, 27, "http://example.com/a(b)".to_string())]);
}

#[test]
fn test_www_prefix() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "go to www.example.org.\n");
    assert_eq!(urls(sink.last()), vec![(6, 21, "http://www.example.org".to_string())]);
}

#[test]
fn test_mailto() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "mail mailto:me@x.org\n");
    assert_eq!(urls(sink.last()), vec![(5, 20, "mailto:me@x.org".to_string())]);
}

#[test]
fn test_url_at_line_start() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "https://a.b/c?d=1&e=2\n");
    assert_eq!(urls(sink.last()), vec![(0, 21, "https://a.b/c?d=1&e=2".to_string())]);
}

#[test]
fn test_not_urls() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "ratio 3:4 foo:bar x:// nowww.x\n");
    assert!(urls(sink.last()).is_empty());
    assert_eq!(sink.last().text, "ratio 3:4 foo:bar x:// nowww.x");
}

#[test]
fn test_url_ends_at_markup() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1zhttp://x.org/a&amp;b\n");
    let line = sink.last();
    assert_eq!(line.text, "http://x.org/a&b");
    assert_eq!(urls(line), vec![(0, 14, "http://x.org/a".to_string())]);
}

#[test]
fn test_url_detection_disabled() {
    let mut parser = MudParser::new(ParserOptions {
        enable_url_detection: false,
        ..Default::default()
    });
    let sink = feed(&mut parser, "see http://example.com\n");
    assert!(urls(sink.last()).is_empty());
}

#[test]
fn test_no_detection_inside_mxp_link() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<A href=\"http://x.org\">http://x.org</A>\n");
    assert!(urls(sink.last()).is_empty());
}

#[test]
fn test_url_keeps_color() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[32mhttp://x.org\x1b[0m\n");
    let line = sink.last();
    assert_eq!(urls(line).len(), 1);
    assert_eq!(line.formats[0].style().map(|s| s.fore), Some(parser.get_color(32)));
}
