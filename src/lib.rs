//! # jpath - JMESPath projection for flat records
//!
//! Pulls a sub-structure out of a JSON field with a JMESPath expression and
//! writes the result back as flat fields: one string, a multivalue, or one
//! field per key when the output name is a `*` pattern.
//!
//! ## Modules
//!
//! - **functions**: `from_string`, `pairs`/`items`, `to_hash`, `unroll` for irregular JSON
//! - **query**: order-preserving expression evaluation and the function table
//! - **project**: flattening, field mapping, and the per-record projector
//!
//! ## Quick Start
//!
//! ```rust
//! use jpath::{new_function_table, ProjectConfig, Projector, Record};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let functions = new_function_table();
//! let config = ProjectConfig {
//!     output: "tag_*".into(),
//!     ..ProjectConfig::default()
//! };
//! let projector = Projector::new(&functions, "unroll(Tags, 'Key', 'Value')", config)?;
//!
//! let mut record = Record::default().with_field(
//!     "_raw",
//!     r#"{"Tags": [{"Key": "env", "Value": "prod"}, {"Key": "team", "Value": "core"}]}"#,
//! );
//! projector.project(&mut record)?;
//!
//! assert_eq!(record.get("tag_env"), Some(&json!("prod")));
//! assert_eq!(record.get("tag_team"), Some(&json!("core")));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::{Read, Write};
use tracing::{error, info};

pub mod error;
pub mod functions;
pub mod project;
pub mod query;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ConfigError, FunctionError, ProjectionError, QueryError};
pub use functions::{from_string, new_function_table, pairs, register_functions, to_hash, unroll};
pub use project::{Outcome, Projector, RecordWriter};
pub use query::{FunctionTable, Query};
pub use types::{FieldValue, OutputSpec, ProjectConfig, Record};

/// Counts gathered while projecting a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub emitted: u64,
    pub diagnosed: u64,
}

/// Main entry point: project a JSON Lines stream of records.
///
/// Every record is written, diagnosed or not. An unknown function in the
/// expression stops the stream before the offending record is written.
pub fn project_json<R: Read, W: Write>(
    reader: R,
    writer: &mut RecordWriter<W>,
    projector: &Projector<'_>,
) -> Result<StreamStats> {
    let mut stats = StreamStats::default();
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Record>();

    let config = projector.config();
    info!(input = %config.input, output = %config.output, "projecting records");

    for result in stream {
        let mut record = result.context("Failed to parse record")?;

        match projector.project(&mut record) {
            Ok(Outcome::Diagnosed(_)) => stats.diagnosed += 1,
            Ok(_) => {}
            Err(e) => {
                error!(emitted = stats.emitted, "aborting stream: {}", e);
                writer.flush()?;
                return Err(e).context("Projection aborted");
            }
        }

        writer.write_record(&record)?;
        stats.emitted += 1;
    }

    writer.flush()?;
    info!(emitted = stats.emitted, diagnosed = stats.diagnosed, "stream complete");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stream() {
        let input = concat!(
            r#"{"_raw": "{\"id\": 1, \"tags\": [\"a\", \"b\"]}"}"#,
            "\n",
            r#"{"_raw": "broken"}"#,
            "\n",
        );

        let functions = new_function_table();
        let projector = Projector::new(&functions, "tags", ProjectConfig::default()).unwrap();
        let mut writer = RecordWriter::new(Vec::new());

        let stats = project_json(input.as_bytes(), &mut writer, &projector).unwrap();

        assert_eq!(stats, StreamStats { emitted: 2, diagnosed: 1 });
        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].contains(r#""jpath":["a","b"]"#));
        assert!(lines[1].contains(r#""_jmespath_error":"Invalid JSON.""#));
    }
}
