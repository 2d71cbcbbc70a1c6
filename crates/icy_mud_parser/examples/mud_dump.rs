//! Dumps a captured MUD session as styled lines and events.
//!
//! ```text
//! cargo run --example mud_dump -- session.log --chunk 64
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use flexi_logger::Logger;
use icy_mud_parser::{FormatKind, Gauge, LineId, LineType, MudParser, ParseError, ParsedLine, ParserOptions, ParserSink, SoundRequest};

#[derive(Parser, Debug)]
#[command(version, about = "Parse a MUD session capture and print what the parser sees", long_about = None)]
struct Args {
    /// Capture to read, stdin when omitted
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Parser options in TOML
    #[clap(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Feed the input in chunks of this many characters
    #[clap(long, value_name = "CHARS")]
    chunk: Option<usize>,

    /// Print soft lines and every fragment
    #[clap(long, default_value_t = false)]
    verbose: bool,
}

struct DumpSink {
    verbose: bool,
}

fn describe(kind: &FormatKind) -> String {
    match kind {
        FormatKind::Normal(style) => format!("normal {} on {} {:?}", style.fore, style.back, style.style),
        FormatKind::Link(link) => format!("url {}", link.href),
        FormatKind::MxpLink(link) => format!("link {}", link.href),
        FormatKind::MxpSend(link) => format!("send {:?} hint {:?}", link.commands, link.hint),
        FormatKind::MxpExpired(link) => format!("expired {}", link.href),
        FormatKind::Image(image) => format!("image {}{}", image.url, image.name),
        other => format!("{other:?}"),
    }
}

impl ParserSink for DumpSink {
    fn add_line(&mut self, line: &ParsedLine) {
        if line.fragment && !self.verbose {
            return;
        }
        let marker = if line.fragment { "~" } else { "|" };
        println!("{marker} {}", line.text);
        if self.verbose {
            for format in &line.formats {
                println!("    @{:<3} {}", format.offset, describe(&format.kind));
            }
        }
    }

    fn line_changed(&mut self, id: LineId, line: &ParsedLine) {
        println!("* line {id} changed: {}", line.text);
    }

    fn bell(&mut self) {
        println!("* bell");
    }

    fn set_title(&mut self, title: &str, kind: u32) {
        println!("* title {kind}: {title}");
    }

    fn music(&mut self, request: &SoundRequest) {
        println!("* music {}", request.location());
    }

    fn sound(&mut self, request: &SoundRequest) {
        println!("* sound {} volume {}", request.location(), request.volume);
    }

    fn tag_reply(&mut self, tag: &str, args: &[String]) {
        println!("* reply {tag} {}", args.join(" "));
    }

    fn tag_end(&mut self, line_type: LineType, text: &str) {
        println!("* {line_type} ended: {text}");
    }

    fn gauge(&mut self, gauge: &Gauge) {
        println!("* gauge {} {:?}/{:?}", gauge.entity, gauge.value, gauge.max);
    }

    fn set_variable(&mut self, name: &str, value: &str) {
        println!("* set {name} = {value}");
    }

    fn report_error(&mut self, error: ParseError) {
        log::log!(log::Level::from(error.level()), "{error}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let options = match &args.options {
        Some(path) => ParserOptions::load(path)?,
        None => ParserOptions::default(),
    };
    let mut input = String::new();
    match &args.path {
        Some(path) => input = String::from_utf8_lossy(&std::fs::read(path)?).into_owned(),
        None => {
            std::io::stdin().read_to_string(&mut input)?;
        }
    }

    let mut parser = MudParser::new(options);
    let mut sink = DumpSink { verbose: args.verbose };
    match args.chunk.filter(|n| *n > 0) {
        Some(size) => {
            let chars: Vec<char> = input.chars().collect();
            for chunk in chars.chunks(size) {
                let chunk: String = chunk.iter().collect();
                parser.parse(&chunk, true, &mut sink);
            }
        }
        None => parser.parse(&input, true, &mut sink),
    }
    log::info!("{} lines, {} characters", parser.lines().len(), parser.text_length());
    Ok(())
}
