use super::*;
use icy_mud_parser::{FontStyle, FormatKind, Rgb};
use pretty_assertions::assert_eq;

fn first_send(line: &ParsedLine) -> Option<String> {
    line.formats.iter().find_map(|f| match &f.kind {
        FormatKind::MxpSend(link) => Some(link.href.clone()),
        _ => None,
    })
}

#[test]
fn test_custom_element_expands() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT boldred '<B><C red>'>\n\x1b[1z<boldred>hi</boldred> there\n");
    let line = sink.last();
    assert_eq!(line.text, "hi there");
    let style = line.formats[0].style().expect("style");
    assert_eq!(Some(style.fore), Rgb::parse("red"));
    assert!(style.style.contains(FontStyle::BOLD));
    let after = line.formats.last().and_then(|f| f.style()).expect("style");
    assert!(!after.style.contains(FontStyle::BOLD));
    assert!(sink.errors.is_empty());
}

#[test]
fn test_secure_element_ignored_on_open_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT boldred '<B><C red>'>\n\x1b[0z<boldred>x</boldred>\n");
    let line = sink.last();
    assert_eq!(line.text, "x");
    assert!(line.formats[0].style().is_some_and(|s| !s.style.contains(FontStyle::BOLD)));
}

#[test]
fn test_open_element_on_open_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT hl '<C blue>' OPEN>\n\x1b[0z<hl>x</hl>\n");
    assert_eq!(sink.last().formats[0].style().map(|s| s.fore), Rgb::parse("blue"));
}

#[test]
fn test_element_attributes() {
    let mut parser = MudParser::default();
    let sink = feed(
        &mut parser,
        "\x1b[1z<!ELEMENT exit '<SEND href=\"go &dir;\">' ATT='dir=north'>\n\x1b[1z<exit dir=south>South</exit> <exit>North</exit>\n",
    );
    let line = sink.last();
    assert_eq!(line.text, "South North");
    let hrefs: Vec<String> = line.formats.iter().filter_map(|f| f.kind.link()).map(|l| l.href.clone()).collect();
    assert_eq!(hrefs, vec!["go south", "go north"]);
}

#[test]
fn test_attlist_replaces_attributes() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT ex '<SEND &cmd;>'><!ATTLIST ex cmd=look>\n\x1b[1z<ex>here</ex>\n");
    assert_eq!(first_send(sink.last()).as_deref(), Some("look"));
}

#[test]
fn test_flagged_element_sets_variable() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT RName '<B>' FLAG='Set roomname'>\n\x1b[1z<RName>Town Square</RName>\n");
    assert_eq!(sink.variables, vec![("roomname".to_string(), "Town Square".to_string())]);
    assert_eq!(sink.flags, vec![("Set roomname".to_string(), "Town Square".to_string())]);
}

#[test]
fn test_element_delete() {
    let mut parser = MudParser::default();
    feed(&mut parser, "\x1b[1z<!ELEMENT foo '<B>'>\n");
    assert!(parser.registries().elements.contains(&"FOO".to_string()));
    feed(&mut parser, "\x1b[1z<!ELEMENT foo DELETE>\n");
    assert!(!parser.registries().elements.contains(&"FOO".to_string()));
}

#[test]
fn test_server_cannot_replace_local_element() {
    let mut parser = MudParser::default();
    let mut sink = CollectSink::new();
    parser.parse("\x1b[1z<!ELEMENT foo '<B>'>\n", false, &mut sink);
    parser.parse("\x1b[1z<!ELEMENT foo '<I>'>\n", true, &mut sink);
    let element = parser.registries().elements.get(&"FOO".to_string()).expect("element");
    assert_eq!(element.definition, "<B>");
}

#[test]
fn test_custom_entity() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ENTITY hp 100 DESC='hit points'>\n\x1b[1zHP &hp;\n");
    assert_eq!(sink.last().text, "HP 100");
    assert_eq!(parser.public_entity("hp"), Some("100"));
    let entity = parser.registries().entities.get(&"hp".to_string()).expect("entity");
    assert_eq!(entity.description, "hit points");
}

#[test]
fn test_entity_add_remove_delete() {
    let mut parser = MudParser::default();
    feed(&mut parser, "\x1b[1z<!ENTITY list a><!ENTITY list b ADD><!ENTITY list c ADD>\n");
    assert_eq!(parser.public_entity("list"), Some("a|b|c"));
    feed(&mut parser, "\x1b[1z<!ENTITY list b REMOVE>\n");
    assert_eq!(parser.public_entity("list"), Some("a|c"));
    feed(&mut parser, "\x1b[1z<!ENTITY list DELETE>\n");
    assert_eq!(parser.public_entity("list"), None);
}

#[test]
fn test_private_entity() {
    let mut parser = MudParser::default();
    feed(&mut parser, "\x1b[1z<!ENTITY secret x PRIVATE>\n");
    assert_eq!(parser.public_entity("secret"), None);
    assert!(parser.registries().entities.contains(&"secret".to_string()));
}

#[test]
fn test_recursive_entity_stops() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ENTITY loop '&loop;'>\n\x1b[1za&loop;b\n");
    assert_eq!(sink.last().text, "ab");
    let unsupported = sink.errors.iter().filter(|e| matches!(e, ParseError::UnsupportedFeature { .. })).count();
    assert_eq!(unsupported, 1);
}

#[test]
fn test_line_tag_colors_line() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!TAG 20 fore=red>\n\x1b[20zalert\nnext\n");
    let lines = sink.finished();
    assert_eq!(lines[1].text, "alert");
    assert_eq!(lines[1].formats.len(), 1);
    assert_eq!(lines[1].formats[0].style().map(|s| s.fore), Rgb::parse("red"));
    assert_eq!(lines[1].raw, "\x1b[20zalert\n");
    assert_eq!(lines[2].formats[0].style().map(|s| s.fore), Some(parser.get_color(37)));
    assert!(sink.tag_ends.contains(&(LineType(20), "alert".to_string())));
}

#[test]
fn test_line_tag_bound_to_element() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!ELEMENT rn '<B>' TAG=20 FLAG=roomname>\n\x1b[20zTown\n");
    let line = sink.last();
    assert_eq!(line.text, "Town");
    assert!(line.formats[0].style().is_some_and(|s| s.style.contains(FontStyle::BOLD)));
    assert_eq!(sink.flags, vec![("roomname".to_string(), "Town".to_string())]);
}

#[test]
fn test_gagged_line_tag() {
    let mut parser = MudParser::default();
    let sink = feed(&mut parser, "\x1b[1z<!TAG 21 GAG>\n\x1b[21zsecret\nshown\n");
    let lines = sink.finished();
    assert!(lines[1].gagged);
    assert_eq!(lines[1].text, "secret");
    assert!(!lines[2].gagged);
}

#[test]
fn test_clear_mxp_forgets_definitions() {
    let mut parser = MudParser::default();
    feed(&mut parser, "\x1b[1z<!ELEMENT foo '<B>'><!ENTITY hp 1>\n");
    parser.clear_mxp();
    assert!(parser.registries().elements.is_empty());
    assert!(parser.registries().entities.is_empty());
}
