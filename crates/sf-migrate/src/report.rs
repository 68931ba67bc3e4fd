//! Status report rendering

use serde::Serialize;
use sf_core::MigrationRecord;
use std::fmt;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MIN_WIDTH: usize = 19;

/// Recorded migrations in insertion order
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub migrations: Vec<MigrationRecord>,
}

impl StatusReport {
    pub fn new(migrations: Vec<MigrationRecord>) -> Self {
        Self { migrations }
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Three-column table (name, status, last change) between separator rows
impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<[String; 3]> = self
            .migrations
            .iter()
            .map(|m| {
                [
                    m.name.to_string(),
                    m.status.to_string(),
                    m.status_changed_at.format(TIME_FORMAT).to_string(),
                ]
            })
            .collect();

        let header = ["Name", "Status", "Changed at"];
        let mut widths = [MIN_WIDTH; 3];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let border = widths
            .iter()
            .map(|w| "_".repeat(w + 2))
            .collect::<Vec<_>>()
            .join(".");
        writeln!(f, ".{border}.")?;
        write_row(f, &widths, &header.map(String::from))?;
        for row in &rows {
            write_row(f, &widths, row)?;
        }
        write!(f, ".{border}.")
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize; 3], cells: &[String; 3]) -> fmt::Result {
    writeln!(
        f,
        "| {:<w0$} | {:<w1$} | {:<w2$} |",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    )
}
