//! CSV export for building rankings.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::ranking::Ranked;

/// Column header of the ranking export.
const HEADER: &str = "rank,building_id,name,time,watts,shade,intensity,r,g,b,alpha";

/// Exports a ranking to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ranking(ranking: &[Ranked], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_ranking_csv(ranking, buf)
}

/// Writes a ranking as CSV to any writer.
///
/// One row per building in rank order. `intensity` is empty for buildings
/// without data. Names containing commas are quoted.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_ranking_csv(ranking: &[Ranked], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for r in ranking {
        wtr.write_record(&[
            r.rank.to_string(),
            r.building_id.to_string(),
            r.name.clone(),
            r.time.to_string(),
            format!("{:.4}", r.watts),
            r.shade.label().to_string(),
            r.shade
                .intensity()
                .map(|i| format!("{i:.4}"))
                .unwrap_or_default(),
            r.color.r.to_string(),
            r.color.g.to_string(),
            r.color.b.to_string(),
            r.color.alpha.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
