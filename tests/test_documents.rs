//! Document-level behaviour: schemas, directives, anchors, merge keys,
//! multi-document streams, and the CST round-trip hooks.

use indoc::indoc;
use pretty_assertions::assert_eq;
use yawl::{
    parse, parse_all_documents, parse_cst, parse_document, parse_with, visit, Node, Options,
    SchemaId, Value, Version, Visit,
};

#[test]
fn core_schema_resolves_common_scalars() {
    let value = parse(indoc! {"
        str: hello
        int: 42
        hex: 0x1f
        float: 6.8
        bool: True
        null1: ~
        null2: null
    "})
    .unwrap();
    assert_eq!(value["str"].as_str(), Some("hello"));
    assert_eq!(value["int"].as_i64(), Some(42));
    assert_eq!(value["hex"].as_i64(), Some(31));
    assert_eq!(value["float"].as_f64(), Some(6.8));
    assert_eq!(value["bool"].as_bool(), Some(true));
    assert!(value["null1"].is_null());
    assert!(value["null2"].is_null());
}

#[test]
fn quoting_styles_produce_the_same_string() {
    let value = parse("a: 'x'\nb: \"x\"\nc: x\n").unwrap();
    assert_eq!(value["a"], value["b"]);
    assert_eq!(value["b"], value["c"]);
}

#[test]
fn double_quote_escapes() {
    let value = parse(r#"s: "tab\there \u0041 \x41 end""#).unwrap();
    assert_eq!(value["s"].as_str(), Some("tab\there A A end"));
}

#[test]
fn block_scalars_respect_chomping() {
    let value = parse("clip: |\n  a\n  b\nstrip: |-\n  c\nkeep: |+\n  d\n\n").unwrap();
    assert_eq!(value["clip"].as_str(), Some("a\nb\n"));
    assert_eq!(value["strip"].as_str(), Some("c"));
    assert_eq!(value["keep"].as_str(), Some("d\n\n"));
}

#[test]
fn folded_scalars_fold_single_breaks() {
    let value = parse(">\n  one\n  two\n\n  three\n").unwrap();
    assert_eq!(value.as_str(), Some("one two\nthree\n"));
}

#[test]
fn nested_block_collections() {
    let value = parse(indoc! {"
        a:
          b: 1
          c:
            - 2
            - x: 3
        d: 4
    "})
    .unwrap();
    assert_eq!(value["a"]["b"].as_i64(), Some(1));
    assert_eq!(value["a"]["c"][0].as_i64(), Some(2));
    assert_eq!(value["a"]["c"][1]["x"].as_i64(), Some(3));
    assert_eq!(value["d"].as_i64(), Some(4));
}

#[test]
fn indentless_sequence_as_map_value() {
    let value = parse("items:\n- 1\n- 2\n").unwrap();
    assert_eq!(value["items"][1].as_i64(), Some(2));
}

#[test]
fn flow_collections_nest() {
    let value = parse("root: {a: 1, b: [2, {c: 3}]}\n").unwrap();
    assert_eq!(value["root"]["a"].as_i64(), Some(1));
    assert_eq!(value["root"]["b"][1]["c"].as_i64(), Some(3));
}

#[test]
fn flow_pair_inside_sequence_becomes_a_map() {
    let value = parse("[a: b, c]\n").unwrap();
    assert_eq!(value[0]["a"].as_str(), Some("b"));
    assert_eq!(value[1].as_str(), Some("c"));
}

#[test]
fn explicit_keys() {
    let value = parse("? complex key\n: its value\nplain: 1\n").unwrap();
    assert_eq!(value["complex key"].as_str(), Some("its value"));
    assert_eq!(value["plain"].as_i64(), Some(1));
}

#[test]
fn anchors_and_aliases_share_values() {
    let value = parse("base: &b\n  x: 1\nother: *b\n").unwrap();
    assert_eq!(value["base"], value["other"]);
}

#[test]
fn later_anchor_declarations_bind_later_aliases_only() {
    let value = parse("a: &x 1\nb: *x\nc: &x 2\nd: *x\n").unwrap();
    assert_eq!(value["b"].as_i64(), Some(1));
    assert_eq!(value["d"].as_i64(), Some(2));
}

#[test]
fn merge_keys_apply_under_yaml_1_1() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        ..Options::default()
    };
    let src = "base: &b {x: 1, y: 2}\nderived:\n  <<: *b\n  y: 3\n";
    let value = parse_with(src, &opts).unwrap();
    assert_eq!(value["derived"]["x"].as_i64(), Some(1));
    assert_eq!(value["derived"]["y"].as_i64(), Some(3), "explicit keys win");
}

#[test]
fn merge_keys_accept_a_sequence_of_aliases() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        ..Options::default()
    };
    let src = "a: &a {x: 1}\nb: &b {x: 9, y: 2}\nm:\n  <<: [*a, *b]\n";
    let value = parse_with(src, &opts).unwrap();
    // Earlier merge sources win for repeated keys.
    assert_eq!(value["m"]["x"].as_i64(), Some(1));
    assert_eq!(value["m"]["y"].as_i64(), Some(2));
}

#[test]
fn merge_is_inert_under_the_core_schema() {
    let value = parse("base: &b {x: 1}\nderived:\n  <<: *b\n").unwrap();
    // `<<` stays an ordinary key whose value is the aliased map.
    assert_eq!(value["derived"]["<<"]["x"].as_i64(), Some(1));
}

#[test]
fn merge_value_must_alias_a_map() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        ..Options::default()
    };
    let doc = parse_document("a: &a [1]\nm:\n  <<: *a\n", &opts);
    assert!(
        doc.errors
            .iter()
            .any(|e| e.message.contains("Merge sources must be maps")),
        "errors: {:#?}",
        doc.errors
    );
}

#[test]
fn duplicate_keys_warn_but_are_preserved() {
    let doc = parse_document("a: 1\na: 2\n", &Options::default());
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert_eq!(doc.warnings.len(), 1);
    assert!(doc.warnings[0]
        .message
        .contains("Map keys must be unique; \"a\" is repeated"));
    let map = doc.contents.as_ref().and_then(Node::as_map).unwrap();
    assert_eq!(map.items.len(), 2, "both pairs stay on the AST");
    // The later pair wins in the host value.
    assert_eq!(doc.to_value().unwrap()["a"].as_i64(), Some(2));
}

#[test]
fn version_directive_enables_1_1_booleans_in_core() {
    let value = parse("%YAML 1.1\n---\nanswer: yes\n").unwrap();
    assert_eq!(value["answer"].as_bool(), Some(true));
    // Without the directive, 1.2 keeps `yes` a string.
    let value = parse("answer: yes\n").unwrap();
    assert_eq!(value["answer"].as_str(), Some("yes"));
}

#[test]
fn tag_directive_declares_a_prefix() {
    let doc = parse_document(
        "%TAG !e! tag:example.com,2000:\n---\n!e!thing bar\n",
        &Options::default(),
    );
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert_eq!(
        doc.tag_prefixes.get("!e!").map(String::as_str),
        Some("tag:example.com,2000:")
    );
    assert!(doc.warnings.iter().any(|w| w
        .message
        .contains("tag tag:example.com,2000:thing is unavailable")));
    assert_eq!(doc.to_value().unwrap(), Value::String("bar".to_string()));
}

#[test]
fn unknown_directives_warn_and_parse_continues() {
    let doc = parse_document("%FOO bar\n---\nx: 1\n", &Options::default());
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert!(doc.warnings.iter().any(|w| w
        .message
        .contains("YAML only supports %TAG and %YAML directives, and not %FOO")));
    assert_eq!(doc.to_value().unwrap()["x"].as_i64(), Some(1));
}

#[test]
fn unsupported_versions_warn_and_parse_as_1_2() {
    let doc = parse_document("%YAML 2.0\n---\nx: yes\n", &Options::default());
    assert!(doc.warnings.iter().any(|w| w.message.contains("Unsupported YAML version")));
    assert_eq!(doc.version, Some(Version::V1_2));
    assert_eq!(doc.to_value().unwrap()["x"].as_str(), Some("yes"));
}

#[test]
fn multi_document_streams() {
    let docs = parse_all_documents("a: 1\n---\nb: 2\n...\nc: 3\n", &Options::default());
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].to_value().unwrap()["a"].as_i64(), Some(1));
    assert_eq!(docs[1].to_value().unwrap()["b"].as_i64(), Some(2));
    assert_eq!(docs[2].to_value().unwrap()["c"].as_i64(), Some(3));
    assert!(docs[1].has_directives_end);
    assert!(docs[1].has_document_end);
}

#[test]
fn parse_document_rejects_surplus_documents() {
    let doc = parse_document("a: 1\n---\nb: 2\n", &Options::default());
    assert!(
        doc.errors
            .iter()
            .any(|e| e.message.contains("parse_all_documents")),
        "errors: {:#?}",
        doc.errors
    );
}

#[test]
fn yaml_1_1_schema_extras() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        version: Version::V1_1,
        ..Options::default()
    };
    let value = parse_with(
        "bin: !!binary aGVsbG8=\nwhen: 2001-12-14\nflag: on\nnum: 1_000\n",
        &opts,
    )
    .unwrap();
    assert_eq!(value["bin"].as_bytes(), Some(b"hello".as_slice()));
    assert_eq!(value["when"].as_str(), Some("2001-12-14"));
    assert_eq!(value["flag"].as_bool(), Some(true));
    assert_eq!(value["num"].as_i64(), Some(1000));
}

#[test]
fn omap_requires_single_key_maps() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        ..Options::default()
    };
    let doc = parse_document("!!omap\n- a: 1\n- b: 2\n", &opts);
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);

    let doc = parse_document("!!omap\n- 1\n", &opts);
    assert!(doc
        .errors
        .iter()
        .any(|e| e.message.contains("single-key maps")));
}

#[test]
fn set_values_must_be_empty() {
    let opts = Options {
        schema: SchemaId::Yaml11,
        ..Options::default()
    };
    let doc = parse_document("!!set\n? a\n? b\n", &opts);
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);

    let doc = parse_document("!!set\na: 1\n", &opts);
    assert!(doc
        .errors
        .iter()
        .any(|e| e.message.contains("Set items must all have null values")));
}

#[test]
fn custom_tags_resolve_and_stringify() {
    use yawl::{ResolveFn, Scalar, StringifyFn, Tag, TagContext, TestFn};

    fn is_shout(raw: &str, _ctx: &TagContext) -> bool {
        raw.len() > 1 && raw.ends_with('!')
    }
    fn resolve_shout(raw: &str, _ctx: &TagContext) -> Result<Value, String> {
        Ok(Value::String(raw.trim_end_matches('!').to_uppercase()))
    }
    fn stringify_shout(s: &Scalar, _ctx: &TagContext) -> String {
        format!("{}!", s.value.as_str().unwrap_or_default().to_lowercase())
    }

    let mut tag = Tag::scalar(
        "!shout",
        Some(is_shout as TestFn),
        resolve_shout as ResolveFn,
    );
    tag.stringify = Some(stringify_shout as StringifyFn);
    let opts = Options {
        custom_tags: vec![tag],
        ..Options::default()
    };

    let doc = parse_document("msg: loud!\n", &opts);
    assert!(doc.errors.is_empty(), "errors: {:#?}", doc.errors);
    assert_eq!(
        doc.to_value().unwrap()["msg"],
        Value::String("LOUD".to_string())
    );
    let out = doc.to_yaml_string().unwrap();
    assert!(out.contains("!shout loud!"), "{out:?}");
}

#[test]
fn failsafe_schema_keeps_strings() {
    let opts = Options {
        schema: SchemaId::Failsafe,
        ..Options::default()
    };
    let value = parse_with("a: 42\nb: true\n", &opts).unwrap();
    assert_eq!(value["a"].as_str(), Some("42"));
    assert_eq!(value["b"].as_str(), Some("true"));
}

#[test]
fn as_big_int_resolves_wide_integers() {
    let mut opts = Options::default();
    opts.scalar.int.as_big_int = true;
    let value = parse_with("n: 7\n", &opts).unwrap();
    assert_eq!(value["n"].as_i128(), Some(7));
    assert!(value["n"].as_i64().is_none());
}

#[test]
fn keep_cst_nodes_links_ast_back_to_cst() {
    let opts = Options {
        keep_cst_nodes: true,
        ..Options::default()
    };
    let doc = parse_document("a: 1\n", &opts);
    assert!(doc.cst.is_some());
    let map = doc.contents.as_ref().and_then(Node::as_map).unwrap();
    assert_eq!(map.cst, Some(0), "the root resolves from the first CST node");

    let doc = parse_document("a: 1\n", &Options::default());
    let map = doc.contents.as_ref().and_then(Node::as_map).unwrap();
    assert!(doc.cst.is_none());
    assert!(map.cst.is_none());
}

#[test]
fn cst_ranges_and_orig_ranges() {
    let mut stream = parse_cst("a: 1\r\nb: 2\r\n");
    assert_eq!(stream.documents.len(), 1);
    assert!(stream.set_orig_ranges(), "CR was observed");
    let contents = stream.documents[0].contents.as_ref().unwrap();
    let orig = contents.orig_range.unwrap();
    assert_eq!(orig.start, 0);
    // "b: 2" ends at byte 10 normalized, byte 12 in the CRLF original.
    assert!(orig.end > contents.range.end);

    let mut stream = parse_cst("a: 1\n");
    assert!(!stream.set_orig_ranges());
}

#[test]
fn comments_survive_into_the_ast() {
    let doc = parse_document("# top comment\na: 1 # trailing\n", &Options::default());
    let map = doc.contents.as_ref().and_then(Node::as_map).unwrap();
    assert_eq!(map.comment_before.as_deref(), Some(" top comment"));
    let value = map.items[0].value.as_ref().unwrap();
    assert_eq!(value.comment(), Some(" trailing"));
}

#[test]
fn visit_can_rewrite_a_parsed_document() {
    let mut doc = parse_document("a: hello\nb: [world, 2]\n", &Options::default());
    let contents = doc.contents.as_mut().unwrap();
    visit(contents, &mut |_, node, _| {
        if let Node::Scalar(s) = node {
            if let Value::String(text) = &s.value {
                s.value = Value::String(text.to_uppercase());
                s.source = None;
            }
        }
        Visit::Continue
    });
    let value = doc.to_value().unwrap();
    // Keys are strings too, so they were uppercased as well.
    assert_eq!(value["A"].as_str(), Some("HELLO"));
    assert_eq!(value["B"][0].as_str(), Some("WORLD"));
    assert_eq!(value["B"][1].as_i64(), Some(2));
}

#[test]
fn document_set_contents_and_schema() {
    let mut doc = yawl::Document::new(&Options::default());
    doc.set_contents(Value::from(vec![1i64, 2]));
    assert_eq!(doc.to_value().unwrap()[1].as_i64(), Some(2));
    doc.set_schema(SchemaId::Failsafe, &[]);
    assert_eq!(doc.schema().id, SchemaId::Failsafe);
}
