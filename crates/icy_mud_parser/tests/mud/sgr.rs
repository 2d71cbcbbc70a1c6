use super::*;
use icy_mud_parser::{ColorCode, FontStyle, FormatKind, ParserOptions, Rgb, TextStyle};
use pretty_assertions::assert_eq;

fn style_at(line: &ParsedLine, index: usize) -> &TextStyle {
    line.formats[index].style().expect("not a normal fragment")
}

#[test]
fn test_plain_text_single_fragment() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "one\ntwo\n");
    assert_eq!(sink.texts(), vec!["one", "two"]);
    let default_fore = parser.colors().resolve(&ColorCode::DEFAULT_FORE);
    for line in sink.finished() {
        assert_eq!(line.formats.len(), 1);
        assert_eq!(line.formats[0].offset, 0);
        assert_eq!(style_at(line, 0).fore, default_fore);
    }
}

#[test]
fn test_red_then_reset() {
    let mut parser = MudParser::default();
    let before = parser.current_ansi_code();
    let sink = feed(&mut parser, "\x1b[31mHello\x1b[0m World\n");
    let line = sink.last();
    assert_eq!(line.text, "Hello World");
    assert_eq!(line.formats.len(), 2);
    assert_eq!((line.formats[0].offset, line.formats[1].offset), (0, 5));
    assert_eq!(style_at(line, 0).fore, Rgb::new(128, 0, 0));
    assert_eq!(style_at(line, 1).fore, parser.colors().resolve(&ColorCode::DEFAULT_FORE));
    let spans: Vec<(usize, usize)> = line.spans().iter().map(|(s, e, _)| (*s, *e)).collect();
    assert_eq!(spans, vec![(0, 5), (5, 11)]);
    assert_eq!(parser.current_ansi_code(), before);
}

#[test]
fn test_bold_brightens() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1;31mX\n");
    let style = style_at(sink.last(), 0);
    assert_eq!(style.fore, Rgb::new(255, 0, 0));
    assert!(!style.style.contains(FontStyle::BOLD));
}

#[test]
fn test_palette_and_truecolor() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[38;5;196mX\x1b[48;2;1;2;3mY\n");
    let line = sink.last();
    assert_eq!(style_at(line, 0).fore, parser.colors().resolve(&ColorCode::Palette(196)));
    assert_eq!(style_at(line, 1).back, Rgb::new(1, 2, 3));
    assert_eq!(style_at(line, 1).fore, style_at(line, 0).fore);
}

#[test]
fn test_inverse_swaps_colors() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[7mX\n");
    let style = style_at(sink.last(), 0);
    assert_eq!(style.fore, parser.colors().resolve(&ColorCode::DEFAULT_BACK));
    assert_eq!(style.back, parser.colors().resolve(&ColorCode::DEFAULT_FORE));
    assert!(!style.style.contains(FontStyle::INVERSE));
}

#[test]
fn test_blink_needs_flashing() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[5mX\n");
    assert!(!style_at(sink.last(), 0).style.intersects(FontStyle::BLINK));

    let mut parser = MudParser::new(ParserOptions {
        enable_flashing: true,
        ..Default::default()
    });
    let sink = feed(&mut parser, "\x1b[5mX\n");
    assert!(style_at(sink.last(), 0).style.contains(FontStyle::SLOW_BLINK));
}

#[test]
fn test_hidden_text_is_blanked() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[8mab\x1b[0mc\n");
    assert_eq!(sink.last().text, "  c");
}

#[test]
fn test_underline_and_italic() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[3;4mX\x1b[23mY\n");
    let line = sink.last();
    assert!(style_at(line, 0).style.contains(FontStyle::ITALIC | FontStyle::UNDERLINE));
    assert!(!style_at(line, 1).style.contains(FontStyle::ITALIC));
    assert!(style_at(line, 1).style.contains(FontStyle::UNDERLINE));
}

#[test]
fn test_color_override() {
    let mut parser = MudParser::default();
    assert!(parser.set_color(31, "#102030"));
    assert!(!parser.set_color(31, "not a color"));
    let sink = feed(&mut parser, "\x1b[31mX\n");
    assert_eq!(style_at(sink.last(), 0).fore, Rgb::new(0x10, 0x20, 0x30));
}

#[test]
fn test_xterm_title() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b]0;My Title\x07after\n");
    assert_eq!(sink.titles, vec![("My Title".to_string(), 0)]);
    assert_eq!(sink.texts(), vec!["after"]);
}

#[test]
fn test_cut_sequence_is_reported() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[3\nabc\n");
    assert_eq!(sink.texts(), vec!["", "abc"]);
    assert!(matches!(sink.errors[0], ParseError::MalformedSequence { .. }));
    assert!(matches!(sink.last().formats[0].kind, FormatKind::Normal(_)));
}

#[test]
fn test_cursor_sequences_are_ignored() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "a\x1b[2Kb\x1b[10;5Hc\n");
    assert_eq!(sink.texts(), vec!["abc"]);
    assert!(sink.errors.is_empty());
}

#[test]
fn test_cursor_sequence_closes_open_markup() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[0z<B>bold\x1b[Hplain\n");
    let line = sink.last();
    assert_eq!(line.text, "boldplain");
    assert_eq!(line.formats.len(), 2);
    assert_eq!(line.formats[1].offset, 4);
    assert!(style_at(line, 0).style.contains(FontStyle::BOLD));
    assert!(!style_at(line, 1).style.contains(FontStyle::BOLD));
    assert_eq!(parser.style_stack().depth(), 0);
}
