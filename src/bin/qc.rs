//! Generate visitor save/load procedures from annotated C struct declarations.
//!
//! Usage:
//!   qc [OPTIONS] [INPUT]
//!   qc < serial.h > serial-qc.c
//!
//! Modes (default: compile):
//!   --emit-ir     Parse only; print the declaration list as JSON
//!   --from-json   Read a JSON declaration list and generate code from it
//!   --dump        Parse only; print a readable declaration tree
//!
//! Output is written only when the whole input succeeds.

use anyhow::Context;
use clap::Parser as ClapParser;
use qcgen::{dump, logger, Config};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(name = "qc", version, about = "Generate visitor save/load procedures from annotated C structs")]
struct Args {
    /// Input file; stdin when absent
    input: Option<PathBuf>,

    /// Output file; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix of generated procedure names
    #[arg(long, default_value = "qc")]
    prefix: String,

    /// Type-name suffix dropped to form the visit_type_* name
    #[arg(long, default_value = "_t")]
    strip_suffix: String,

    /// Linked-list base type (repeatable; replaces the default GSList)
    #[arg(long = "list-type", value_name = "TYPE")]
    list_types: Vec<String>,

    /// Print the parsed declarations as JSON instead of generating code
    #[arg(long, conflicts_with_all = ["from_json", "dump"])]
    emit_ir: bool,

    /// Treat the input as a JSON declaration list
    #[arg(long, conflicts_with = "dump")]
    from_json: bool,

    /// Print a readable declaration tree instead of generating code
    #[arg(long)]
    dump: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config {
            prefix: self.prefix.clone(),
            strip_suffix: self.strip_suffix.clone(),
            ..Config::default()
        };
        if !self.list_types.is_empty() {
            config.list_types = self.list_types.clone();
        }
        config
    }

    fn open_input(&self) -> anyhow::Result<Box<dyn Read>> {
        match &self.input {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(io::stdin().lock())),
        }
    }

    fn input_name(&self) -> String {
        self.input
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);
    let config = args.config();
    let name = args.input_name();
    let mut reader = args.open_input()?;

    let text = if args.from_json {
        let mut json = String::new();
        reader
            .read_to_string(&mut json)
            .with_context(|| format!("read {}", name))?;
        qcgen::generate_from_json(&json, &config).with_context(|| name.clone())?
    } else if args.emit_ir || args.dump {
        let decls = qcgen::parse_reader(reader, &config).with_context(|| name.clone())?;
        log::info!("{}: {} declaration(s)", name, decls.len());
        if args.dump {
            dump::declarations_to_text(&decls)
        } else {
            qcgen::declarations_to_json(&decls)? + "\n"
        }
    } else {
        qcgen::compile_reader(reader, &config).with_context(|| name.clone())?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
