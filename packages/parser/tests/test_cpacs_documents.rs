use cpacs_common::DocumentBackend;
use cpacs_parser::{parse, serialize};

const AIRCRAFT: &str = include_str!("../../editor/tests/fixtures/simple_aircraft.xml");

#[test]
fn test_fixture_parses() {
    let result = parse(AIRCRAFT);
    if let Err(e) = &result {
        eprintln!("Parse error: {:?}", e);
    }
    let doc = result.unwrap();
    assert_eq!(doc.root().name, "cpacs");
    assert!(doc.resolve_path("/cpacs/vehicles/aircraft/model/wings/wing/sections/section[3]"));
    assert!(!doc.resolve_path("/cpacs/vehicles/aircraft/model/wings/wing/sections/section[4]"));
}

#[test]
fn test_serialized_output_is_stable() {
    let first = serialize(&parse(AIRCRAFT).unwrap());
    let second = serialize(&parse(&first).unwrap());
    assert_eq!(first, second);
    assert!(first.starts_with("<?xml"));
}

#[test]
fn test_uid_lookup_across_vehicle() {
    let doc = parse(AIRCRAFT).unwrap();
    let path = doc.path_of_uid("Wing_Sec2").unwrap();
    assert_eq!(
        doc.get_attribute(&path, "uID").unwrap().as_deref(),
        Some("Wing_Sec2")
    );
    assert!(path.ends_with("section[2]"));
}

#[test]
fn test_text_with_entities_survives_round_trip() {
    let source = r#"<cpacs><header><name>Wing &amp; Body &lt;test&gt;</name></header></cpacs>"#;
    let doc = parse(source).unwrap();
    assert_eq!(
        doc.root().first_child_named("header").unwrap().child_text("name").as_deref(),
        Some("Wing & Body <test>")
    );
    let again = parse(&serialize(&doc)).unwrap();
    assert_eq!(doc, again);
}

#[test]
fn test_truncated_fixture_is_rejected() {
    let truncated = &AIRCRAFT[..AIRCRAFT.len() / 2];
    let err = parse(truncated).unwrap_err();
    assert!(err.pos() <= truncated.len());
}
