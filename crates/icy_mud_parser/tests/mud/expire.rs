use super::*;
use icy_mud_parser::FormatKind;
use pretty_assertions::assert_eq;

const EXITS: &str = "\x1b[1z<SEND href=look expire=room>look</SEND> <SEND href=north expire=exit>north</SEND>\n";

fn kinds(line: &ParsedLine) -> Vec<u8> {
    line.formats.iter().map(|f| f.kind.kind_id()).filter(|id| *id != 0).collect()
}

#[test]
fn test_expire_by_name() {
    let mut parser = MudParser::default();
    feed(&mut parser, EXITS);
    let sink = feed(&mut parser, "\x1b[1z<EXPIRE room>\n");
    assert_eq!(sink.expired, vec![vec!["room".to_string()]]);
    assert_eq!(sink.changed.len(), 1);
    let (id, line) = &sink.changed[0];
    assert_eq!(*id, 0);
    // expired opener, skipped closer, untouched exit link
    assert_eq!(kinds(line), vec![8, 9, 6, 7]);
    assert!(matches!(&line.formats[1].kind, FormatKind::MxpExpired(link) if link.href == "look"));
    assert_eq!(parser.lines().line(0), Some(line));
}

#[test]
fn test_expire_unknown_name_changes_nothing() {
    let mut parser = MudParser::default();
    feed(&mut parser, EXITS);
    let sink = feed(&mut parser, "\x1b[1z<EXPIRE nothing>\n");
    assert!(sink.changed.is_empty());
    assert_eq!(kinds(parser.lines().line(0).expect("line")), vec![6, 7, 6, 7]);
}

#[test]
fn test_expire_all() {
    let mut parser = MudParser::default();
    feed(&mut parser, EXITS);
    feed(&mut parser, "\x1b[1z<A href=\"http://x.org\">site</A>\n");
    let sink = feed(&mut parser, "\x1b[1z<EXPIRE>\n");
    assert_eq!(sink.changed.len(), 2);
    assert_eq!(kinds(parser.lines().line(0).expect("line")), vec![8, 9, 8, 9]);
    assert_eq!(kinds(parser.lines().line(1).expect("line")), vec![8, 9]);
}

#[test]
fn test_expire_within_current_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<SEND href=a expire=x>a</SEND> <SEND href=b>b</SEND><EXPIRE x>\n");
    assert_eq!(kinds(sink.last()), vec![8, 9, 6, 7]);
    assert!(sink.changed.is_empty());
}

#[test]
fn test_expire_open_link() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<SEND href=a expire=x>a<EXPIRE x>b</SEND>\n");
    let line = sink.last();
    assert_eq!(line.text, "ab");
    assert_eq!(kinds(line), vec![8]);
    assert!(sink.errors.is_empty());
}

#[test]
fn test_expire_after_soft_line() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.parse("\x1b[1z<SEND href=look expire=room>lo", true, &mut sink);
    parser.parse("ok</SEND>\n", true, &mut sink);
    assert_eq!(parser.lines().len(), 1);
    let sink = feed(&mut parser, "\x1b[1z<EXPIRE room>\n");
    assert_eq!(sink.changed.len(), 1);
    assert_eq!(kinds(parser.lines().line(0).expect("line")), vec![8, 9]);
}
