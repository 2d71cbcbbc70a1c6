use super::*;
use icy_mud_parser::{ParseQueue, ParseRequest};
use pretty_assertions::assert_eq;

/// Answers the first line by queueing more input, the way a trigger would.
struct QueueSink {
    queue: ParseQueue,
    lines: Vec<String>,
    pushed: bool,
}

impl ParserSink for QueueSink {
    fn add_line(&mut self, line: &ParsedLine) {
        if line.fragment {
            return;
        }
        self.lines.push(line.text.clone());
        if !self.pushed {
            self.pushed = true;
            self.queue.push(ParseRequest::new("queued\n"));
        }
    }
}

#[test]
fn test_sink_defers_input() {
    let mut parser = MudParser::default();
    let mut sink = QueueSink {
        queue: parser.queue(),
        lines: Vec::new(),
        pushed: false,
    };
    parser.parse("first\n", true, &mut sink);
    assert_eq!(sink.lines, vec!["first", "queued"]);
    assert_eq!(parser.queue_len(), 0);
}

#[test]
fn test_pending_requests_run_first() {
    let mut parser = MudParser::default();
    let queue = parser.queue();
    queue.push(ParseRequest::new("a\n"));
    queue.push(ParseRequest::new(""));
    assert_eq!(parser.queue_len(), 1);
    assert!(parser.queue_ends_with_line());
    let sink = feed(&mut parser, "b\n");
    assert_eq!(sink.texts(), vec!["a", "b"]);
}

#[test]
fn test_forced_request_jumps_queue() {
    let mut parser = MudParser::default();
    parser.queue().push(ParseRequest::new("partial"));
    assert!(!parser.queue_ends_with_line());
    let mut sink = CollectSink::new();
    parser.submit(ParseRequest::new("b\n").with_force(true), &mut sink);
    assert_eq!(sink.texts(), vec!["b"]);
    assert_eq!(sink.lines.last().map(|l| l.text.as_str()), Some("partial"));
}

#[test]
fn test_local_echo_is_marked() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.submit(ParseRequest::local("say hi\n"), &mut sink);
    parser.parse("You say hi\n", true, &mut sink);
    let lines = sink.finished();
    assert!(!lines[0].remote);
    assert!(lines[1].remote);
}

#[test]
fn test_empty_chunk_drains_pending() {
    let mut parser = MudParser::default();
    parser.queue().push(ParseRequest::new("waiting\n"));
    let sink = feed(&mut parser, "");
    assert_eq!(sink.texts(), vec!["waiting"]);
    assert_eq!(parser.queue_len(), 0);
}
