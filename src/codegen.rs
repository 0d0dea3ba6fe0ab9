//! Emit save/load procedures for struct-shaped declarations.
//!
//! Each procedure drives the external visitor API:
//! `visit_start_struct` / `visit_end_struct`, `visit_start_array` / `visit_end_array`,
//! `visit_start_list` / `visit_has_more` / `visit_end_list`, one `visit_type_<T>` per
//! dispatch type, and `error_set` for capacity violations. Fields are emitted in
//! declaration order according to their [`Classification`].

use crate::ast::*;
use crate::config::Config;
use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Save,
    Load,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Save => "save",
            Direction::Load => "load",
        }
    }
}

/// Element type used for containers whose element type is not declared.
const UNTYPED_ELEMENT: &str = "gpointer";

#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: Config,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Generator { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate code for every struct-shaped declaration, in order.
    pub fn generate(&self, decls: &[Declaration]) -> Result<String, fmt::Error> {
        let mut out = String::new();
        for decl in decls {
            self.write_declaration(&mut out, decl)?;
        }
        Ok(out)
    }

    /// Write the save and load procedures for one declaration. Prototypes produce nothing.
    pub fn write_declaration<W: Write>(&self, out: &mut W, decl: &Declaration) -> fmt::Result {
        let (name, body) = match decl.struct_shape() {
            Some(shape) => shape,
            None => {
                match decl {
                    Declaration::Function(f) => log::debug!("no procedures for prototype {}", f.name),
                    _ => log::warn!("skipping anonymous struct: no name to generate procedures for"),
                }
                return Ok(());
            }
        };
        let c_type = match decl {
            Declaration::Struct(_) => format!("struct {}", name),
            _ => name.to_string(),
        };
        self.write_procedure(out, name, &c_type, body, Direction::Save)?;
        self.write_procedure(out, name, &c_type, body, Direction::Load)
    }

    /// Name of the generated procedure, e.g. `qc_save_SerialState`.
    pub fn procedure_name(&self, type_name: &str, direction: Direction) -> String {
        format!("{}_{}_{}", self.config.prefix, direction.verb(), type_name)
    }

    fn write_procedure<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        c_type: &str,
        body: &StructDecl,
        direction: Direction,
    ) -> fmt::Result {
        writeln!(
            out,
            "void {}(Visitor *v, {} *s, const char *name, Error **errp)",
            self.procedure_name(name, direction),
            c_type
        )?;
        writeln!(out, "{{")?;
        writeln!(out, "    visit_start_struct(v, \"{}\", name, errp);", name)?;
        for field in &body.fields {
            log::trace!("{} {}.{}: {:?}", direction.verb(), name, field.variable, field.classification);
            self.write_field(out, field, direction)?;
        }
        writeln!(out, "    visit_end_struct(v, errp);")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn write_field<W: Write>(&self, out: &mut W, field: &FieldDecl, direction: Direction) -> fmt::Result {
        let var = field.variable.as_str();
        let ty = self.config.dispatch_name(&field.base_type);
        match &field.classification {
            Classification::Skipped { .. } => Ok(()),
            Classification::Plain => {
                writeln!(out, "    visit_type_{}(v, &s->{}, \"{}\", errp);", ty, var, var)
            }
            Classification::FixedArray { size, capacity } => {
                let size = match size {
                    SizeExpr::Field(n) => format!("s->{}", n),
                    SizeExpr::Constant(c) => c.clone(),
                };
                if let Some(cap) = capacity {
                    writeln!(out, "    if ({} > {}) {{", size, cap)?;
                    writeln!(
                        out,
                        "        error_set(errp, QERR_FAULT, \"Array size greater than capacity.\");"
                    )?;
                    writeln!(out, "    }}")?;
                    writeln!(out, "    {} = MIN({}, {});", size, size, cap)?;
                }
                writeln!(out, "    visit_start_array(v, \"{}\", errp);", var)?;
                writeln!(out, "    for (size_t i = 0; i < {}; i++) {{", size)?;
                writeln!(out, "        visit_type_{}(v, &s->{}[i], NULL, errp);", ty, var)?;
                writeln!(out, "    }}")?;
                writeln!(out, "    visit_end_array(v, errp);")
            }
            Classification::DefaultValued { literal } => match direction {
                Direction::Save => {
                    writeln!(out, "    if (s->{} != {}) {{", var, literal)?;
                    writeln!(out, "        visit_type_{}(v, &s->{}, \"{}\", errp);", ty, var, var)?;
                    writeln!(out, "    }}")
                }
                Direction::Load => {
                    writeln!(out, "    s->{} = {};", var, literal)?;
                    writeln!(out, "    visit_type_{}(v, &s->{}, \"{}\", NULL);", ty, var, var)
                }
            },
            Classification::Container { element_type } => {
                self.write_container(out, var, element_type.as_deref(), direction)
            }
        }
    }

    fn write_container<W: Write>(
        &self,
        out: &mut W,
        var: &str,
        element_type: Option<&str>,
        direction: Direction,
    ) -> fmt::Result {
        writeln!(out, "    visit_start_list(v, \"{}\", errp);", var)?;
        match (direction, element_type) {
            (Direction::Save, Some(elem)) => {
                writeln!(out, "    for (GSList *i = s->{}; i; i = i->next) {{", var)?;
                writeln!(out, "        {} *value = i->data;", elem)?;
                writeln!(
                    out,
                    "        visit_type_{}(v, value, NULL, errp);",
                    self.config.dispatch_name(elem)
                )?;
            }
            (Direction::Save, None) => {
                writeln!(out, "    for (GSList *i = s->{}; i; i = i->next) {{", var)?;
                writeln!(out, "        {} value = i->data;", UNTYPED_ELEMENT)?;
                writeln!(out, "        visit_type_{}(v, &value, NULL, errp);", UNTYPED_ELEMENT)?;
            }
            (Direction::Load, Some(elem)) => {
                writeln!(out, "    while (visit_has_more(v, errp)) {{")?;
                writeln!(out, "        {} *value = g_malloc0(sizeof(*value));", elem)?;
                writeln!(
                    out,
                    "        visit_type_{}(v, value, NULL, errp);",
                    self.config.dispatch_name(elem)
                )?;
                writeln!(out, "        s->{} = g_slist_append(s->{}, value);", var, var)?;
            }
            (Direction::Load, None) => {
                writeln!(out, "    while (visit_has_more(v, errp)) {{")?;
                writeln!(out, "        {} value = NULL;", UNTYPED_ELEMENT)?;
                writeln!(out, "        visit_type_{}(v, &value, NULL, errp);", UNTYPED_ELEMENT)?;
                writeln!(out, "        s->{} = g_slist_append(s->{}, value);", var, var)?;
            }
        }
        writeln!(out, "    }}")?;
        writeln!(out, "    visit_end_list(v, errp);")
    }
}
