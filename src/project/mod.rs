//! JSON query results projected onto flat records
//!
//! A [`Projector`] compiles one expression and applies it to each record:
//! the input field is parsed, queried, and the result is flattened into one
//! or more output fields.

pub mod flatten;
pub mod mapper;
pub mod projector;
pub mod writer;

pub use flatten::{collapse, flatten, Tokens};
pub use mapper::{map_result, output_to_field, output_to_wildcard_fields};
pub use projector::{Outcome, Projector};
pub use writer::RecordWriter;
