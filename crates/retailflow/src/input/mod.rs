//! Raw input: dataset acquisition and delimited-file parsing.

mod acquire;
mod parser;
mod source;

pub use acquire::{csv_files, locate_csv_dir, DatasetSource, HttpArchive, LocalDirectory};
pub use parser::{Parser, ParserConfig};
pub use source::RawFile;
