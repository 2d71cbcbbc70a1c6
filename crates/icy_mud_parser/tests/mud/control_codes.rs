use super::*;
use icy_mud_parser::{ParserOptions, WindowSize};
use pretty_assertions::assert_eq;

fn with_options(options: ParserOptions) -> MudParser {
    MudParser::new(options)
}

#[test]
fn test_bell() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "a\x07b\n");
    assert_eq!(sink.bells, 1);
    assert_eq!(sink.texts(), vec!["ab"]);

    let mut parser = with_options(ParserOptions {
        enable_bell: false,
        ..Default::default()
    });
    let sink = feed(&mut parser, "a\x07b\n");
    assert_eq!(sink.bells, 0);
}

#[test]
fn test_display_control_codes() {
    let mut parser = with_options(ParserOptions {
        display_control_codes: true,
        ..Default::default()
    });
    let sink = feed(&mut parser, "a\x07b\x01\n");
    assert_eq!(sink.texts(), vec!["a\u{2407}b\u{2401}"]);
    assert_eq!(sink.bells, 1);
}

#[test]
fn test_backspace() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "abc\x08d\n");
    assert_eq!(sink.texts(), vec!["abd"]);
    assert_eq!(parser.text_length(), 4);
}

#[test]
fn test_backspace_on_empty_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x08x\n");
    assert_eq!(sink.texts(), vec!["x"]);
}

#[test]
fn test_tab_stops() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "a\tb\n");
    assert_eq!(sink.texts(), vec!["a       b"]);

    let mut parser = with_options(ParserOptions {
        tab_width: 4,
        ..Default::default()
    });
    let sink = feed(&mut parser, "ab\tc\tx\n");
    assert_eq!(sink.texts(), vec!["ab  c   x"]);
}

#[test]
fn test_carriage_return_ignored() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "abc\r\ndef\r\n");
    assert_eq!(sink.texts(), vec!["abc", "def"]);
}

#[test]
fn test_terminal_emulation() {
    let mut parser = with_options(ParserOptions {
        emulate_terminal: true,
        ..Default::default()
    });
    let sink = feed(&mut parser, "\x01\x7F\u{00B0}x\n");
    assert_eq!(sink.texts(), vec!["☺⌂░x"]);
}

#[test]
fn test_control_codes_not_emulated() {
    let mut parser = with_options(ParserOptions {
        emulate_control_codes: false,
        ..Default::default()
    });
    let sink = feed(&mut parser, "a\x1b[31mb\x07\n");
    assert_eq!(sink.texts(), vec!["a[31mb"]);
    assert_eq!(sink.bells, 0);
}

#[test]
fn test_clear_screen_scrolls_window() {
    let mut parser = with_options(ParserOptions {
        window: WindowSize { width: 80, height: 2 },
        ..Default::default()
    });
    let sink = feed(&mut parser, "x\x1b[2Jy\n");
    assert_eq!(sink.texts(), vec!["x", "", "", "y"]);
}

#[test]
fn test_text_length_counts_line_breaks() {
    let mut parser = MudParser::default();
    feed(&mut parser, "ab\ncd");
    assert_eq!(parser.text_length(), 5);
    assert!(!parser.end_of_line());
}

#[test]
fn test_unicode_marks_fragment() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "é\n€\n");
    let lines = sink.finished();
    assert!(lines[0].formats[0].style().is_some_and(|s| !s.unicode));
    assert!(lines[1].formats[0].style().is_some_and(|s| s.unicode));
}

#[test]
fn test_clear_drops_partial_line() {
    let mut parser = MudParser::default();
    feed(&mut parser, "one\n\x1b[1z<B");
    parser.clear();
    assert!(parser.lines().is_empty());
    assert!(parser.end_of_line());
    let sink = feed(&mut parser, "two\n");
    assert_eq!(sink.texts(), vec!["two"]);
}
