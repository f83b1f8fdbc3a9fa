//! Small CSV samples of stage outputs, for manual inspection.

use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::table::{Table, Value};

/// Name of the column recording which table a sampled row came from.
pub const SOURCE_COLUMN: &str = "source";

/// How rows are picked from each table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// The first rows of each table.
    Head,
    /// A uniform random subset, kept in table order.
    Random { seed: Option<u64> },
}

/// Combines bounded samples of several tables into one CSV file.
#[derive(Debug, Clone)]
pub struct SampleExporter {
    max_rows: usize,
    sampling: Sampling,
}

impl SampleExporter {
    pub fn head(max_rows: usize) -> Self {
        Self {
            max_rows,
            sampling: Sampling::Head,
        }
    }

    pub fn random(max_rows: usize) -> Self {
        Self {
            max_rows,
            sampling: Sampling::Random { seed: None },
        }
    }

    /// Fix the random seed so samples are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Sampling::Random { .. } = self.sampling {
            self.sampling = Sampling::Random { seed: Some(seed) };
        }
        self
    }

    /// Sample each table and stack the rows into one table.
    ///
    /// Columns are the union across tables in first-seen order, followed by
    /// a `source` column; cells a table lacks are null.
    pub fn sample<'a>(&self, tables: impl IntoIterator<Item = &'a Table>) -> Table {
        let mut rng = match self.sampling {
            Sampling::Random { seed: Some(seed) } => fastrand::Rng::with_seed(seed),
            _ => fastrand::Rng::new(),
        };

        let tables: Vec<&Table> = tables.into_iter().collect();
        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !headers.contains(&column.name) {
                    headers.push(column.name.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in &tables {
            let positions: Vec<Option<usize>> =
                headers.iter().map(|h| table.column_index(h)).collect();
            for row_idx in self.pick_rows(table.row_count(), &mut rng) {
                let row = &table.rows[row_idx];
                let mut sampled: Vec<Value> = positions
                    .iter()
                    .map(|p| p.map_or(Value::Null, |idx| row[idx].clone()))
                    .collect();
                sampled.push(Value::text(table.name.as_str()));
                rows.push(sampled);
            }
        }

        headers.push(SOURCE_COLUMN.to_string());
        Table::from_value_rows("sample", headers, rows)
    }

    /// Sample the tables and write them to a CSV file, returning the row count.
    pub fn export<'a>(
        &self,
        tables: impl IntoIterator<Item = &'a Table>,
        path: &Path,
    ) -> Result<usize> {
        let sample = self.sample(tables);
        write_csv(&sample, path)?;
        Ok(sample.row_count())
    }

    fn pick_rows(&self, total: usize, rng: &mut fastrand::Rng) -> Vec<usize> {
        match self.sampling {
            Sampling::Head => (0..total.min(self.max_rows)).collect(),
            Sampling::Random { .. } => {
                // Reservoir sampling over row positions.
                let mut reservoir: Vec<usize> = Vec::with_capacity(self.max_rows.min(total));
                for idx in 0..total {
                    if reservoir.len() < self.max_rows {
                        reservoir.push(idx);
                    } else {
                        let j = rng.usize(0..=idx);
                        if j < self.max_rows {
                            reservoir[j] = idx;
                        }
                    }
                }
                reservoir.sort_unstable();
                reservoir
            }
        }
    }
}

/// Write a table as CSV with a header row; nulls become empty fields.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}
