//! Validate a JSON pattern database and write the compact artifact.
//!
//! The database is compiled into a full `PatternStore` first, so every
//! load-time check runs before anything is written. The written artifact is
//! read back and compared against the source.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use idiomscan::PatternStore;
use idiomscan::idiom_detection::patterns::{read_database, write_artifact};

#[derive(Parser, Debug)]
#[command(about = "Validate a JSON pattern database and write the bincode+zstd artifact")]
struct Args {
    /// JSON pattern database
    #[arg(long, default_value = "resources/idioms/patterns.json")]
    input: PathBuf,

    /// Artifact to write
    #[arg(long, default_value = "resources/idioms/patterns.bincode.zst")]
    output: PathBuf,

    /// Validate only, do not write the artifact
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let count = generate(&args.input, &args.output, args.check)?;

    if args.check {
        println!("{}: {} patterns OK", args.input.display(), count);
    } else {
        println!(
            "Wrote {} patterns from {} to {}",
            count,
            args.input.display(),
            args.output.display()
        );
    }
    Ok(())
}

fn generate(input: &Path, output: &Path, check_only: bool) -> Result<usize> {
    let database = read_database(input)?;
    let store = PatternStore::from_database(&database)
        .with_context(|| format!("Validation failed for {}", input.display()))?;

    if check_only {
        return Ok(store.len());
    }

    write_artifact(&database, output)?;

    let restored = read_database(output)?;
    if restored != database {
        bail!(
            "Artifact {} does not reproduce {}",
            output.display(),
            input.display()
        );
    }

    Ok(store.len())
}
