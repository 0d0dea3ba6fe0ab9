//! Format parsed declarations as an indented text tree (`qc --dump`).

use crate::ast::*;

/// One line per declaration header and one per field.
pub fn declarations_to_text(decls: &[Declaration]) -> String {
    let mut lines = Vec::new();
    for decl in decls {
        declaration_lines(decl, &mut lines);
    }
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn declaration_lines(decl: &Declaration, lines: &mut Vec<String>) {
    match decl {
        Declaration::Struct(s) => {
            lines.push(format!("struct {}", s.name.as_deref().unwrap_or("<anonymous>")));
            lines.extend(s.fields.iter().map(|f| format!("  {}", field_summary(f))));
        }
        Declaration::Typedef(t) => {
            let tag = t
                .underlying
                .name
                .as_deref()
                .map(|n| format!(" (struct {})", n))
                .unwrap_or_default();
            lines.push(format!("typedef {}{}", t.alias, tag));
            lines.extend(t.underlying.fields.iter().map(|f| format!("  {}", field_summary(f))));
        }
        Declaration::Function(f) => {
            let args: Vec<String> = f
                .args
                .iter()
                .map(|a| {
                    format!(
                        "{}{}{} {}",
                        if a.is_const { "const " } else { "" },
                        a.c_type(),
                        if a.is_pointer { " *" } else { "" },
                        a.variable
                    )
                })
                .collect();
            lines.push(format!(
                "function {} -> {}{}{}",
                f.name,
                if f.return_type.is_struct { "struct " } else { "" },
                f.return_type.name,
                if f.return_type.is_pointer { " *" } else { "" },
            ));
            if !args.is_empty() {
                lines.push(format!("  ({})", args.join(", ")));
            }
        }
    }
}

/// `name: type [pointer] <classification>`
pub fn field_summary(f: &FieldDecl) -> String {
    let mut s = format!("{}: ", f.variable);
    if f.is_const {
        s.push_str("const ");
    }
    s.push_str(&f.c_type());
    if f.is_pointer {
        s.push_str(" *");
    }
    s.push(' ');
    s.push_str(&classification_text(&f.classification));
    if let Some(v) = &f.version {
        s.push_str(&format!(" version={}", v));
    }
    s
}

fn classification_text(c: &Classification) -> String {
    match c {
        Classification::Plain => "plain".to_string(),
        Classification::Skipped { reason } => format!("skipped({})", reason.marker()),
        Classification::FixedArray { size, capacity } => {
            let size = match size {
                SizeExpr::Field(n) => format!("size_is {}", n),
                SizeExpr::Constant(c) => c.clone(),
            };
            match capacity {
                Some(cap) => format!("array[{}; capacity {}]", size, cap),
                None => format!("array[{}]", size),
            }
        }
        Classification::DefaultValued { literal } => format!("default({})", literal),
        Classification::Container { element_type } => {
            format!("list<{}>", element_type.as_deref().unwrap_or("?"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn dump_struct_fields() {
        let decls = parse(
            "struct S { int count _size_is(n) [8]; uint8_t _derived thr; GSList *l _type_of(Dev); };",
        )
        .expect("parse");
        let text = declarations_to_text(&decls);
        assert_eq!(
            text,
            "struct S\n  count: int array[size_is n; capacity 8]\n  thr: uint8_t skipped(_derived)\n  l: GSList * list<Dev>\n"
        );
    }

    #[test]
    fn dump_function() {
        let decls = parse("struct Foo *make(const char *name);").expect("parse");
        let text = declarations_to_text(&decls);
        assert_eq!(text, "function make -> struct Foo *\n  (const char * name)\n");
    }
}
