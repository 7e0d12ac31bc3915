//! Error handling: diagnostics collect on the document, stringification is
//! refused, and the high-level helpers throw the first error.

use pretty_assertions::assert_eq;
use yawl::{
    parse, parse_document, parse_with, ErrorKind, LinePos, LogLevel, NodeType, Options, Value,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn tab_indented_map_yields_four_semantic_errors() {
    init_logging();
    let doc = parse_document("a:\n\t1\nb:\n\t2\n", &Options::default());
    assert_eq!(doc.errors.len(), 4, "errors: {:#?}", doc.errors);
    assert!(doc.errors.iter().all(|e| e.kind == ErrorKind::Semantic));
    let tabs = doc
        .errors
        .iter()
        .filter(|e| e.message.contains("Tabs are not allowed as indentation"))
        .count();
    let implicit = doc
        .errors
        .iter()
        .filter(|e| {
            e.message
                .contains("Implicit map keys need to be followed by map values")
        })
        .count();
    assert_eq!((tabs, implicit), (2, 2));

    let refused = doc.to_yaml_string().unwrap_err();
    assert!(refused
        .message
        .contains("Document with errors cannot be stringified"));
}

#[test]
fn trailing_bare_key_is_an_implicit_key_error() {
    let doc = parse_document("abc: 123\ndef", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    let err = &doc.errors[0];
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.name(), "YAMLSemanticError");
    assert!(err
        .message
        .contains("Implicit map keys need to be followed by map values"));
    let (start, end) = err.line_pos.expect("pretty errors carry line positions");
    assert_eq!(start, LinePos { line: 2, col: 1 });
    assert_eq!(end, LinePos { line: 2, col: 4 });
}

#[test]
fn flow_map_empty_item_is_a_syntax_error() {
    let doc = parse_document("{ , }", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    let err = &doc.errors[0];
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.node_type, Some(NodeType::FlowMap));
    assert!(err.message.contains("Unexpected , in flow map"));
    let (start, end) = err.line_pos.unwrap();
    assert_eq!(start, LinePos { line: 1, col: 3 });
    assert_eq!(end, LinePos { line: 1, col: 4 });
    // The collection itself is kept.
    assert_eq!(doc.to_value().unwrap(), Value::Mapping(Default::default()));
}

#[test]
fn unterminated_flow_seq_points_past_the_last_byte() {
    let doc = parse_document("[ foo, bar,", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    let err = &doc.errors[0];
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert_eq!(err.node_type, Some(NodeType::FlowSeq));
    assert!(err.message.contains("Expected flow sequence to end with ]"));
    assert_eq!((err.range.start, err.range.end), (11, 12));
    let (start, end) = err.line_pos.unwrap();
    assert_eq!(start, LinePos { line: 1, col: 12 });
    assert_eq!(end, LinePos { line: 1, col: 13 });
}

#[test]
fn unknown_tag_falls_back_to_str_with_a_warning() {
    init_logging();
    let doc = parse_document("!foo bar", &Options::default());
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert_eq!(doc.warnings.len(), 1);
    assert!(doc.warnings[0]
        .message
        .contains("tag !foo is unavailable, falling back to tag:yaml.org,2002:str"));
    assert_eq!(doc.to_value().unwrap(), Value::String("bar".to_string()));
}

#[test]
fn warnings_are_dropped_below_warn_level() {
    for level in [LogLevel::Error, LogLevel::Silent] {
        let opts = Options {
            log_level: level,
            ..Options::default()
        };
        let doc = parse_document("!foo bar", &opts);
        assert!(doc.warnings.is_empty(), "level {level:?}");
        assert_eq!(doc.to_value().unwrap(), Value::String("bar".to_string()));
    }
}

#[test]
fn non_pretty_errors_keep_the_source_slice() {
    let opts = Options {
        pretty_errors: false,
        ..Options::default()
    };
    let doc = parse_document("{ , }", &opts);
    let err = &doc.errors[0];
    assert!(err.line_pos.is_none());
    assert_eq!(err.source.as_deref(), Some(","));
    assert_eq!(err.message, "Unexpected , in flow map");
}

#[test]
fn parse_throws_the_first_error() {
    let err = parse("{ , }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(parse("a: 1").is_ok());
}

#[test]
fn empty_input_yields_a_null_document_without_errors() {
    let doc = parse_document("", &Options::default());
    assert!(doc.errors.is_empty());
    assert!(doc.contents.is_none());
    assert_eq!(doc.to_value().unwrap(), Value::Null);
}

#[test]
fn bare_directives_end_marker_is_an_empty_document() {
    let doc = parse_document("---", &Options::default());
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert!(doc.has_directives_end);
    assert!(doc.contents.is_none());
}

#[test]
fn directives_without_a_document_fail() {
    let doc = parse_document("%YAML 1.2\n", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    assert_eq!(doc.errors[0].kind, ErrorKind::Semantic);
    assert_eq!(doc.errors[0].node_type, Some(NodeType::Directive));
    assert!(doc.errors[0]
        .message
        .contains("Missing directives-end indicator line"));
}

#[test]
fn trailing_content_after_a_closed_scalar() {
    let doc = parse_document("\"x\" y\n", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    assert_eq!(doc.errors[0].kind, ErrorKind::Syntax);
    assert!(doc.errors[0]
        .message
        .contains("Document contains trailing content"));
}

#[test]
fn missing_closing_quotes() {
    let doc = parse_document("key: \"unterminated", &Options::default());
    assert!(doc
        .errors
        .iter()
        .any(|e| e.message.contains("Missing closing \"quote")));

    let doc = parse_document("key: 'unterminated", &Options::default());
    assert!(doc
        .errors
        .iter()
        .any(|e| e.message.contains("Missing closing 'quote")));
}

#[test]
fn misaligned_collection_items_are_reported() {
    // Quoted items cannot absorb the stray line as plain-scalar
    // continuation, so the misalignment is structural.
    let doc = parse_document("- 'a'\n- 'b'\n    - c\n", &Options::default());
    assert!(
        doc.errors
            .iter()
            .any(|e| e.message.contains("All collection items must start at the same column")),
        "errors: {:#?}",
        doc.errors
    );
}

#[test]
fn alias_expansion_within_the_limit_is_accepted() {
    let opts = Options {
        max_alias_count: 2,
        ..Options::default()
    };
    // Each alias expands to the two elements of the anchored sequence.
    let value = parse_with("a: &x [1,2]\nb: *x\nc: *x\n", &opts).unwrap();
    assert_eq!(value["b"], value["a"]);
    assert_eq!(value["c"][1].as_i64(), Some(2));
}

#[test]
fn alias_expansion_beyond_the_limit_is_fatal() {
    let opts = Options {
        max_alias_count: 1,
        ..Options::default()
    };
    let err = parse_with("a: &x [1,2]\nb: *x\n", &opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Reference);
    assert!(err.message.contains("max_alias_count"));
}

#[test]
fn alias_doubling_chain_trips_the_guard() {
    let opts = Options {
        max_alias_count: 3,
        ..Options::default()
    };
    let src = "a: &a [x, x]\nb: &b [*a, *a]\nc: *b\n";
    let err = parse_with(src, &opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Reference);
}

#[test]
fn zero_alias_count_rejects_every_alias() {
    let opts = Options {
        max_alias_count: 0,
        ..Options::default()
    };
    assert!(parse_with("a: &x 1\nb: *x\n", &opts).is_err());
    assert!(parse_with("a: 1\nb: 2\n", &opts).is_ok());
}

#[test]
fn negative_alias_count_disables_the_guard() {
    let opts = Options {
        max_alias_count: -1,
        ..Options::default()
    };
    let src = "a: &a [x, x, x, x, x, x, x, x]\nb: *a\nc: *a\n";
    assert!(parse_with(src, &opts).is_ok());
}

#[test]
fn alias_before_its_anchor_is_a_reference_error() {
    let doc = parse_document("a: *x\nx: &x 1\n", &Options::default());
    assert_eq!(doc.errors.len(), 1, "errors: {:#?}", doc.errors);
    assert_eq!(doc.errors[0].kind, ErrorKind::Reference);
    assert!(doc.errors[0].message.contains("Aliased anchor not found: x"));
    // Best-effort conversion substitutes null for the broken alias.
    assert!(doc.to_value().unwrap()["a"].is_null());
}
