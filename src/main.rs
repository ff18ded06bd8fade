use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use toxquant::data::{fraction::FractionVector, loader};
use toxquant::pipeline::{compute, DedupKey, PipelineOptions, ZeroSumPolicy};
use toxquant::{chart, export};

const USAGE: &str = "\
Usage: toxquant <peaks-file> <fractions-file> <output.csv> [options]

  <peaks-file>      identification export (.csv, .tsv, .json, .parquet)
  <fractions-file>  replicate weights: a .txt with one value per line, or
                    a weight table (.csv/.tsv/.json/.parquet) whose row i
                    weighs intensity column i (columns are multiplied)
  <output.csv>      per-family abundance, `toxin_family,total_sum`

Options:
  --annotation <file>    toxin annotation table (default: bundled reference)
  --dedup-by-accession   deduplicate by Accession instead of -10lgP score
  --zero-fill            zero-fill zero-sum intensity columns instead of failing
";

struct Args {
    peaks: PathBuf,
    fractions: PathBuf,
    output: PathBuf,
    annotation: Option<PathBuf>,
    options: PipelineOptions,
}

fn parse_args() -> Result<Args> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut annotation = None;
    let mut options = PipelineOptions::default();

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--annotation" => {
                let path = argv.next().context("--annotation requires a file")?;
                annotation = Some(PathBuf::from(path));
            }
            "--dedup-by-accession" => options.dedup = DedupKey::Accession,
            "--zero-fill" => options.zero_sum = ZeroSumPolicy::ZeroFill,
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option '{other}'\n\n{USAGE}"),
            other => positional.push(PathBuf::from(other)),
        }
    }

    match <[PathBuf; 3]>::try_from(positional) {
        Ok([peaks, fractions, output]) => Ok(Args {
            peaks,
            fractions,
            output,
            annotation,
            options,
        }),
        Err(_) => bail!("expected three arguments\n\n{USAGE}"),
    }
}

/// Plain text (one value per line) or any table format the loader knows.
fn load_fractions(path: &Path) -> Result<FractionVector> {
    let is_table = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("csv" | "tsv" | "json" | "parquet" | "pq")
    );
    if is_table {
        let table = loader::load_table(path)
            .with_context(|| format!("loading weight table {}", path.display()))?;
        Ok(FractionVector::from_table(&table)?)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fraction text {}", path.display()))?;
        Ok(FractionVector::from_text(&text)?)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let peaks = loader::load_table(&args.peaks)
        .with_context(|| format!("loading identification table {}", args.peaks.display()))?;
    info!(
        "loaded {} identification rows, {} intensity columns",
        peaks.len(),
        peaks.intensity_columns().len()
    );

    let annotation = match &args.annotation {
        Some(path) => loader::load_table(path)
            .with_context(|| format!("loading annotation table {}", path.display()))?,
        None => loader::builtin_annotation()?,
    };
    let fractions = load_fractions(&args.fractions)?;

    let result = compute(&peaks, &annotation, &fractions, &args.options)?;

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    export::write_csv(&result, file)?;
    info!("wrote {} families to {}", result.len(), args.output.display());

    for slice in chart::pie_series(&result) {
        match &slice.label {
            Some(label) => println!("{label}"),
            None => println!("{}: <1%", slice.family),
        }
    }
    Ok(())
}
