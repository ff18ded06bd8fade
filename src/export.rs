use std::io::{Read, Write};

use anyhow::{Context, Result};

use crate::pipeline::{AbundanceResult, FamilyAbundance};

// ---------------------------------------------------------------------------
// CSV export / re-import of the abundance result
// ---------------------------------------------------------------------------

/// Serialize the result as `toxin_family,total_sum` CSV, one row per
/// family, in result order.
pub fn write_csv<W: Write>(result: &AbundanceResult, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for family in result.iter() {
        wtr.serialize(family).context("writing abundance row")?;
    }
    wtr.flush().context("flushing abundance CSV")?;
    Ok(())
}

/// The CSV export as an in-memory string (what a download handler sends).
pub fn to_csv_string(result: &AbundanceResult) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(result, &mut buf)?;
    String::from_utf8(buf).context("abundance CSV is not UTF-8")
}

/// Re-parse an exported abundance CSV.
pub fn parse_csv<R: Read>(reader: R) -> Result<AbundanceResult> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut families = Vec::new();
    for (row_no, record) in rdr.deserialize::<FamilyAbundance>().enumerate() {
        families.push(record.with_context(|| format!("abundance CSV row {row_no}"))?);
    }
    Ok(AbundanceResult { families })
}
