//! Compiler configuration shared by the parser and the generator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Procedure name prefix: `<prefix>_save_T` / `<prefix>_load_T`.
    pub prefix: String,
    /// Suffix removed from a type name to get its visitor dispatch name (`uint8_t` -> `uint8`).
    pub strip_suffix: String,
    /// Base types that make a field a container without `_type_of`.
    pub list_types: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: "qc".to_string(),
            strip_suffix: "_t".to_string(),
            list_types: vec!["GSList".to_string()],
        }
    }
}

impl Config {
    pub fn is_list_type(&self, type_name: &str) -> bool {
        self.list_types.iter().any(|t| t == type_name)
    }

    /// Visitor dispatch name for a type. Purely syntactic: nothing checks the type exists.
    pub fn dispatch_name<'a>(&self, type_name: &'a str) -> &'a str {
        if self.strip_suffix.is_empty() {
            return type_name;
        }
        match type_name.strip_suffix(self.strip_suffix.as_str()) {
            Some(stem) if !stem.is_empty() => stem,
            _ => type_name,
        }
    }
}
