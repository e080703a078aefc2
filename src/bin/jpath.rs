//! jpath: Apply a JMESPath expression to a stream of JSON records
//!
//! Each input line is a JSON object (a record). The expression is evaluated
//! against the JSON held in the input field and the result is written back
//! to the output field(s). Records are written to stdout in the same order.
//!
//! Usage:
//!   # Extract a nested value from the `_raw` field into `jpath`
//!   jpath 'user.name' events.jsonl
//!
//!   # Read from stdin, one field per tag
//!   cat events.jsonl | jpath --output 'tag_*' "unroll(Tags, 'Key', 'Value')"
//!
//!   # Custom input/error fields and a fallback value
//!   jpath --input payload --error parse_error --default none 'items[].id' events.jsonl

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use jpath::{new_function_table, project_json, ProjectConfig, Projector, RecordWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jpath")]
#[command(about = "Project JSON fields of a record stream with JMESPath", long_about = None)]
struct Args {
    /// JMESPath expression to evaluate
    #[arg(value_name = "EXPRESSION")]
    expression: String,

    /// Input file of JSON Lines records (use stdin if omitted)
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Field receiving per-record error messages
    #[arg(long, default_value = "_jmespath_error")]
    error: String,

    /// Value written to the output field when the expression matches nothing
    #[arg(long)]
    default: Option<String>,

    /// Field holding the JSON text to query
    #[arg(long, default_value = "_raw")]
    input: String,

    /// Output field name; a single `*` fans an object result out to one field per key
    #[arg(long, default_value = "jpath")]
    output: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ProjectConfig {
        error: args.error,
        default: args.default,
        input: args.input,
        output: args.output,
    };

    let functions = new_function_table();
    let projector = Projector::new(&functions, &args.expression, config)
        .context("Invalid configuration")?;

    let reader = if let Some(file_path) = &args.file {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(BufReader::new(std::io::stdin())) as Box<dyn Read>
    };

    let mut writer = RecordWriter::new(BufWriter::new(std::io::stdout().lock()));
    project_json(reader, &mut writer, &projector)?;

    Ok(())
}
