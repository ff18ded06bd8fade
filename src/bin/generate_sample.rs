use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (splitmix64), enough for demo intensities.
struct SplitMix {
    state: u64,
}

impl SplitMix {
    fn new(seed: u64) -> Self {
        SplitMix { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Log-uniform intensity in [10^lo, 10^hi], the usual spread of
    /// label-free peak areas.
    fn intensity(&mut self, lo: f64, hi: f64) -> f64 {
        10f64.powf(lo + self.next_f64() * (hi - lo))
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = SplitMix::new(42);

    // Accessions from the bundled annotation table, plus two that are not
    // annotated as toxins so the demo exercises the inner-join drop.
    let proteins: Vec<(&str, f64)> = vec![
        ("P01391", 142.3),
        ("P24605", 138.7),
        ("P06859", 121.9),
        ("O42187", 117.5),
        ("Q92043", 111.2),
        ("P04971", 104.6),
        ("P81382", 98.4),
        ("Q7T1K6", 93.1),
        ("P22029", 88.8),
        ("P17347", 82.0),
        ("P61898", 76.5),
        ("ALBU_HUMAN", 71.3),
        ("KRT1_HUMAN", 64.9),
    ];
    let replicates = 3;

    let mut scores: Vec<f64> = Vec::new();
    let mut accessions: Vec<&str> = Vec::new();
    let mut areas: Vec<Vec<f64>> = vec![Vec::new(); replicates];

    for &(acc, score) in &proteins {
        // Two peptide-level hits per protein; the second repeats the score
        // so score-keyed deduplication has something to collapse.
        for _ in 0..2 {
            scores.push(score);
            accessions.push(acc);
            for column in areas.iter_mut() {
                column.push(rng.intensity(5.0, 8.0).round());
            }
        }
    }

    // -- Parquet -------------------------------------------------------------
    let mut fields = vec![
        Field::new("-10lgP", DataType::Float64, false),
        Field::new("Accession", DataType::Utf8, false),
    ];
    fields.extend(
        (1..=replicates).map(|i| Field::new(format!("Area Sample {i}"), DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(Float64Array::from(scores.clone())),
        Arc::new(StringArray::from(accessions.clone())),
    ];
    for column in &areas {
        arrays.push(Arc::new(Float64Array::from(column.clone())));
    }
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = std::fs::File::create("sample_peaks.parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    // -- CSV (same rows) -----------------------------------------------------
    let mut wtr = csv::Writer::from_path("sample_peaks.csv")?;
    let mut header = vec!["-10lgP".to_string(), "Accession".to_string()];
    header.extend((1..=replicates).map(|i| format!("Area Sample {i}")));
    wtr.write_record(&header)?;
    for row in 0..scores.len() {
        let mut record = vec![scores[row].to_string(), accessions[row].to_string()];
        record.extend(areas.iter().map(|column| column[row].to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    // -- Fraction text, one weight per replicate ----------------------------
    std::fs::write("sample_fractions.txt", "0.45\n0.35\n0.20\n")?;

    println!(
        "Wrote {} rows x {} replicates to sample_peaks.parquet / sample_peaks.csv, \
         weights to sample_fractions.txt",
        scores.len(),
        replicates
    );
    Ok(())
}
