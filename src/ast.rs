//! Intermediate representation of parsed declarations.
//!
//! The IR is serde-serializable so that parsing and generation can run as separate
//! processes (`qc --emit-ir` / `qc --from-json`).

use serde::{Deserialize, Serialize};

/// One top-level parsed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    Struct(StructDecl),
    Typedef(TypedefDecl),
    Function(FuncDecl),
}

impl Declaration {
    /// The struct body and the name procedures are generated for, if this declaration is struct-shaped.
    ///
    /// A typedef is named by its alias; a bare struct by its tag. Function prototypes and
    /// anonymous bare structs return `None`.
    pub fn struct_shape(&self) -> Option<(&str, &StructDecl)> {
        match self {
            Declaration::Typedef(t) => Some((t.alias.as_str(), &t.underlying)),
            Declaration::Struct(s) => s.name.as_deref().map(|n| (n, s)),
            Declaration::Function(_) => None,
        }
    }

    /// Display name used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Typedef(t) => &t.alias,
            Declaration::Struct(s) => s.name.as_deref().unwrap_or("<anonymous>"),
            Declaration::Function(f) => &f.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Emission order.
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub alias: String,
    pub underlying: StructDecl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub return_type: ReturnType,
    pub name: String,
    pub args: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnType {
    pub name: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_struct: bool,
    #[serde(default)]
    pub is_pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Base type name without the `struct` qualifier.
    pub base_type: String,
    pub variable: String,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_struct: bool,
    #[serde(default)]
    pub is_pointer: bool,
    /// `_version(literal)`; recorded, does not affect generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub classification: Classification,
}

impl FieldDecl {
    pub fn plain(base_type: impl Into<String>, variable: impl Into<String>) -> Self {
        FieldDecl {
            base_type: base_type.into(),
            variable: variable.into(),
            is_const: false,
            is_struct: false,
            is_pointer: false,
            version: None,
            classification: Classification::Plain,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.classification, Classification::Skipped { .. })
    }

    /// C spelling of the base type, e.g. `struct QEMUTimer`.
    pub fn c_type(&self) -> String {
        if self.is_struct {
            format!("struct {}", self.base_type)
        } else {
            self.base_type.clone()
        }
    }
}

/// How a field is serialized. Exactly one per field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Plain,
    Skipped {
        reason: SkipReason,
    },
    FixedArray {
        size: SizeExpr,
        /// Upper bound from a bracket that followed a `_size_is` marker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capacity: Option<String>,
    },
    DefaultValued {
        literal: String,
    },
    Container {
        /// Element type from `_type_of`; `None` when implied by a list base type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element_type: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Derived,
    Immutable,
    Broken,
}

impl SkipReason {
    pub fn marker(self) -> &'static str {
        match self {
            SkipReason::Derived => "_derived",
            SkipReason::Immutable => "_immutable",
            SkipReason::Broken => "_broken",
        }
    }
}

/// Runtime element count of a fixed array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SizeExpr {
    /// `_size_is(n)`: a sibling field holds the count.
    Field(String),
    /// Bracket text: a literal or a named constant.
    Constant(String),
}
