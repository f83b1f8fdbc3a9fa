//! In-memory table model shared by every stage.

mod frame;
mod types;
mod value;

pub use frame::{Column, Table};
pub use types::ColumnType;
pub use value::{parse_timestamp, Value, TIMESTAMP_FORMAT};
