//! Grammar tests: which declarations parse, what IR they produce, and how failures are reported.

use qcgen::{
    compile_reader, parse, parse_reader, Classification, CompileError, Config, Declaration,
    ParseError, SizeExpr, SkipReason, TokenKind,
};

const UART_H: &str = include_str!("data/uart.h");

fn struct_named<'a>(decls: &'a [Declaration], name: &str) -> &'a qcgen::StructDecl {
    decls
        .iter()
        .find_map(|d| d.struct_shape().filter(|(n, _)| *n == name).map(|(_, s)| s))
        .unwrap_or_else(|| panic!("no struct {}", name))
}

// ==================== Syntax: valid programs ====================

#[test]
fn parse_empty_input() {
    let decls = parse("").expect("empty input parses");
    assert!(decls.is_empty());
}

#[test]
fn parse_only_trivia() {
    let src = "#include <stdint.h>\n// nothing here\n/* or here */\n";
    assert!(parse(src).expect("parse").is_empty());
}

#[test]
fn parse_fixture_declarations() {
    let decls = parse(UART_H).expect("parse");
    let names: Vec<_> = decls.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["UartFifo", "PendingIrq", "UartState", "uart_realize", "uart_reset"]);
    assert!(matches!(decls[0], Declaration::Typedef(_)));
    assert!(matches!(decls[2], Declaration::Struct(_)));
    assert!(matches!(decls[3], Declaration::Function(_)));
}

#[test]
fn parse_fixture_field_classifications() {
    let decls = parse(UART_H).expect("parse");
    let state = struct_named(&decls, "UartState");
    let by_name = |n: &str| {
        state
            .fields
            .iter()
            .find(|f| f.variable == n)
            .unwrap_or_else(|| panic!("no field {}", n))
    };

    assert_eq!(by_name("baud_divisor").classification, Classification::Plain);
    assert_eq!(
        by_name("shift_reg").classification,
        Classification::Skipped { reason: SkipReason::Derived }
    );
    assert_eq!(
        by_name("modem_status").classification,
        Classification::DefaultValued { literal: "0xb0".into() }
    );
    assert_eq!(
        by_name("samples").classification,
        Classification::FixedArray {
            size: SizeExpr::Field("nr_samples".into()),
            capacity: Some("32".into()),
        }
    );
    assert_eq!(
        by_name("pending").classification,
        Classification::Container { element_type: Some("PendingIrq".into()) }
    );
    assert_eq!(
        by_name("clk").classification,
        Classification::Skipped { reason: SkipReason::Immutable }
    );
    assert_eq!(
        by_name("poll_timer").classification,
        Classification::Skipped { reason: SkipReason::Broken }
    );
    assert_eq!(by_name("flow_ctrl").version.as_deref(), Some("2"));

    let fifo = struct_named(&decls, "UartFifo");
    assert_eq!(
        fifo.fields[0].classification,
        Classification::FixedArray {
            size: SizeExpr::Constant("UART_FIFO_DEPTH".into()),
            capacity: None,
        }
    );
}

#[test]
fn parse_field_order_is_preserved() {
    let decls = parse("struct S { int c; int a; int b; };").expect("parse");
    let s = struct_named(&decls, "S");
    let order: Vec<_> = s.fields.iter().map(|f| f.variable.as_str()).collect();
    assert_eq!(order, ["c", "a", "b"]);
}

#[test]
fn parse_is_deterministic() {
    let a = parse(UART_H).expect("parse");
    let b = parse(UART_H).expect("parse");
    assert_eq!(a, b);
}

#[test]
fn parse_digraph_braces() {
    let decls = parse("struct S <% int a<:4:>; %>;").expect("parse");
    let s = struct_named(&decls, "S");
    assert!(matches!(s.fields[0].classification, Classification::FixedArray { .. }));
}

#[test]
fn parse_empty_struct() {
    let decls = parse("struct Empty { };").expect("parse");
    assert!(struct_named(&decls, "Empty").fields.is_empty());
}

#[test]
fn parse_char_and_string_default_literals() {
    let decls = parse(r#"struct S { char c _default('x'); const char *s _default("none"); };"#)
        .expect("parse");
    let s = struct_named(&decls, "S");
    assert_eq!(s.fields[0].classification, Classification::DefaultValued { literal: "'x'".into() });
    assert_eq!(
        s.fields[1].classification,
        Classification::DefaultValued { literal: "\"none\"".into() }
    );
}

#[test]
fn parse_from_reader_with_config() {
    let config = Config {
        list_types: vec!["QTailQ".into()],
        ..Config::default()
    };
    let decls = parse_reader("struct S { QTailQ *q; };".as_bytes(), &config).expect("parse");
    assert_eq!(
        struct_named(&decls, "S").fields[0].classification,
        Classification::Container { element_type: None }
    );
}

// ==================== Syntax: invalid programs ====================

#[test]
fn parse_fail_missing_terminator() {
    assert!(matches!(parse("struct S { int a; }"), Err(ParseError::UnexpectedEof { .. })));
}

#[test]
fn parse_fail_missing_field_terminator() {
    let err = parse("struct S { int a int b; };").unwrap_err();
    match err {
        ParseError::Unexpected { expected, found, line } => {
            assert_eq!(expected, "operator ';'");
            assert_eq!(found.kind, TokenKind::Identifier);
            assert_eq!(found.value, "int");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn parse_fail_reports_line() {
    let err = parse("struct S {\n  int a;\n  int 5;\n};").unwrap_err();
    assert!(err.to_string().starts_with("line 3:"), "{}", err);
}

#[test]
fn parse_fail_marker_without_argument() {
    assert!(parse("struct S { int a _default; };").is_err());
    assert!(parse("struct S { int _size_is() a; };").is_err());
}

#[test]
fn parse_fail_default_needs_literal() {
    let err = parse("struct S { int a _default(x); };").unwrap_err();
    assert!(err.to_string().contains("expected literal"), "{}", err);
}

#[test]
fn parse_fail_size_is_needs_identifier() {
    assert!(parse("struct S { int _size_is(4) a; };").is_err());
}

#[test]
fn parse_fail_container_with_array() {
    assert!(matches!(
        parse("struct S { GSList *l[4] _type_of(X); };"),
        Err(ParseError::ConflictingMarkers { .. })
    ));
}

#[test]
fn parse_fail_list_type_with_array_or_default() {
    for src in [
        "struct S { GSList *l[4]; };",
        "struct S { GSList *l _size_is(n); };",
        "struct S { GSList *l _default(0); };",
    ] {
        let err = parse(src).unwrap_err();
        assert!(
            matches!(err, ParseError::ConflictingMarkers { ref first, .. } if first == "GSList"),
            "{}: {}",
            src,
            err
        );
    }
}

#[test]
fn parse_fail_custom_list_type_with_array() {
    let config = Config {
        list_types: vec!["QTailQ".into()],
        ..Config::default()
    };
    let err = parse_reader("struct S { QTailQ *q[2]; };".as_bytes(), &config).unwrap_err();
    assert!(err.to_string().contains("conflicts with QTailQ"), "{}", err);
}

#[test]
fn parse_fail_invalid_utf8() {
    let src: &[u8] = b"struct S { int \xff a; };";
    match compile_reader(src, &Config::default()) {
        Err(CompileError::Parse(ParseError::Unexpected { found, line, .. })) => {
            assert_eq!(found.kind, TokenKind::Unknown);
            assert_eq!(found.value, "\u{FFFD}");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn parse_fail_truncated_utf8_at_eof() {
    let src: &[u8] = b"struct S { int a; }; \xc3";
    assert!(matches!(
        compile_reader(src, &Config::default()),
        Err(CompileError::Parse(ParseError::Unexpected { .. }))
    ));
}

#[test]
fn parse_fail_typedef_without_alias() {
    assert!(parse("typedef struct { int a; };").is_err());
}

#[test]
fn parse_fail_truncated_function() {
    assert!(matches!(parse("int f(int a"), Err(ParseError::UnexpectedEof { .. })));
}

#[test]
fn parse_fail_stops_at_first_error() {
    // the second declaration is broken; nothing after it is considered
    let err = parse("struct A { int a; }; struct B { int ; }; struct C { int c; };").unwrap_err();
    assert!(err.to_string().contains("variable name"), "{}", err);
}
