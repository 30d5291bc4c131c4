//! FILENAME: grid-engine/src/lib.rs
//! PURPOSE: Main library entry point for the row model.
//! CONTEXT: Re-exports the value, row and dataset types plus the coercion
//! helpers shared by the filter parser and the pipeline engine.

pub mod dates;
#[macro_use]
pub mod logging;
pub mod number;
pub mod row;
pub mod value;

// Re-export commonly used types at the crate root
pub use dates::{day_end, day_start, format_date, looks_like_date, parse_date_str, parse_value_date, timestamp_millis};
pub use number::{format_number, is_bare_number, parse_number};
pub use row::{Dataset, Row, RowRef, PATH_SEPARATOR};
pub use value::Value;
