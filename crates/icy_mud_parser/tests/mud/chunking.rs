use super::*;
use icy_mud_parser::ParseRequest;
use pretty_assertions::assert_eq;

const SAMPLES: &[&str] = &[
    "\x1b[31mHello\x1b[0m World\n",
    "\x1b[1z<B>bold</B> &lt;x&gt; see http://example.com/a(b)) ok\n",
    "\x1b[1z<SEND href=\"look\" hint='Look around'>look</SEND> at www.test.org.\n",
    "\x1b[1z<!ENTITY hp 42>\n\x1b[1zHP: &hp; <!-- note -->done\n",
    "!!SOUND(thunder.wav V=80)\n\x1b[38;2;10;20;30mtrue\x1b[48;5;17mcolor\n",
];

fn finished(parser: &mut MudParser, chunks: &[&str]) -> Vec<ParsedLine> {
    let mut sink = CollectSink::new();
    for chunk in chunks {
        parser.parse(chunk, true, &mut sink);
    }
    sink.lines.into_iter().filter(|l| !l.fragment).collect()
}

#[test]
fn test_split_anywhere_gives_same_lines() {
    for sample in SAMPLES {
        let expected = finished(&mut MudParser::default(), &[sample]);
        let boundaries: Vec<usize> = sample.char_indices().map(|(i, _)| i).skip(1).collect();
        for split in boundaries {
            let (head, tail) = sample.split_at(split);
            let lines = finished(&mut MudParser::default(), &[head, tail]);
            assert_eq!(lines, expected, "split {sample:?} at {split}");
        }
    }
}

#[test]
fn test_one_char_at_a_time() {
    for sample in SAMPLES {
        let expected = finished(&mut MudParser::default(), &[sample]);
        let chars: Vec<String> = sample.chars().map(String::from).collect();
        let chunks: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(finished(&mut MudParser::default(), &chunks), expected);
    }
}

#[test]
fn test_soft_line_then_completion() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.parse("abc", true, &mut sink);
    assert_eq!(sink.lines.len(), 1);
    assert!(sink.lines[0].fragment);
    assert_eq!(sink.lines[0].text, "abc");
    assert!(!parser.end_of_line());

    parser.parse("def\n", true, &mut sink);
    assert_eq!(sink.texts(), vec!["abcdef"]);
    assert!(parser.end_of_line());
    assert_eq!(parser.lines().len(), 1);
    assert_eq!(parser.text_length(), 7);
}

#[test]
fn test_soft_line_closes_open_url() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.parse("go http://x.org/pa", true, &mut sink);
    let soft = &sink.lines[0];
    let link = soft.formats.iter().find_map(|f| match &f.kind {
        icy_mud_parser::FormatKind::Link(link) => Some(link.href.clone()),
        _ => None,
    });
    assert_eq!(link.as_deref(), Some("http://x.org/pa"));

    parser.parse("th\n", true, &mut sink);
    let link = sink.last().formats.iter().find_map(|f| f.kind.link().map(|l| l.href.clone()));
    assert_eq!(link.as_deref(), Some("http://x.org/path"));
}

#[test]
fn test_empty_chunk_does_nothing() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "");
    assert!(sink.lines.is_empty());
    assert!(parser.end_of_line());
}

#[test]
fn test_prepend_tail_runs_inside_open_sequence() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.parse("\x1b[3", true, &mut sink);
    parser.submit(ParseRequest::local("xyz").with_prepend_tail(true), &mut sink);
    parser.parse("1mA\n", true, &mut sink);
    let line = sink.last();
    assert_eq!(line.text, "xyzA");
    let offsets: Vec<usize> = line.formats.iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![0, 3]);
    assert_eq!(line.formats[1].style().map(|s| s.fore), Some(icy_mud_parser::Rgb::new(128, 0, 0)));
}
