use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use idiomscan::cli::Cli;
use idiomscan::{FindOptions, IdiomFinder, IdiomResult, MatcherConfig, RuleBasedAdapter};

/// Output entry for one input sentence.
#[derive(Debug, Serialize)]
struct SentenceReport {
    sentence: String,
    idioms: Vec<IdiomResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> std::io::Result<()> {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let multi_progress = init_logging()?;

    let config = match &cli.config {
        Some(path) => MatcherConfig::from_toml_file(path)?,
        None => MatcherConfig::default(),
    };
    let finder = IdiomFinder::from_path(&cli.patterns, Arc::new(RuleBasedAdapter::new()), config)?;

    let options = FindOptions {
        limit: cli.limit,
        html: cli.html,
        span: cli.span,
        debug_range: cli.debug_range,
        debug_id: cli.debug_id,
        timeout: cli.timeout_ms.map(Duration::from_millis),
    };

    let sentences = read_sentences(&cli)?;
    let progress_bar = multi_progress.add(create_progress_bar(sentences.len())?);

    let reports: Vec<SentenceReport> = sentences
        .par_iter()
        .map(|sentence| {
            let report = analyze(&finder, sentence, &options);
            progress_bar.inc(1);
            report
        })
        .collect();
    progress_bar.finish_with_message("Analysis complete!");

    let found: usize = reports.iter().map(|r| r.idioms.len()).sum();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    info!(
        "Analyzed {} sentences: {} idioms found, {} failures",
        reports.len(),
        found,
        failed
    );

    write_output(cli.output.as_deref(), &reports)?;
    Ok(())
}

fn init_logging() -> Result<MultiProgress, Box<dyn Error>> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).build();
    let level = logger.filter();
    let multi_progress = MultiProgress::new();

    LogWrapper::new(multi_progress.clone(), logger).try_init()?;
    log::set_max_level(level);
    Ok(multi_progress)
}

fn read_sentences(cli: &Cli) -> Result<Vec<String>, Box<dyn Error>> {
    let lines: Vec<String> = if !cli.sentences.is_empty() {
        cli.sentences.clone()
    } else if let Some(path) = &cli.input {
        fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input file {}: {}", path.display(), e))?
            .lines()
            .map(str::to_string)
            .collect()
    } else {
        io::stdin().lock().lines().collect::<io::Result<_>>()?
    };

    Ok(lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect())
}

fn analyze(finder: &IdiomFinder, sentence: &str, options: &FindOptions) -> SentenceReport {
    match finder.find(sentence, options) {
        Ok(idioms) => SentenceReport {
            sentence: sentence.to_string(),
            idioms,
            error: None,
        },
        Err(err) => {
            warn!("Failed to analyze {:?}: {}", sentence, err);
            SentenceReport {
                sentence: sentence.to_string(),
                idioms: Vec::new(),
                error: Some(err.to_string()),
            }
        }
    }
}

fn create_progress_bar(total: usize) -> Result<ProgressBar, Box<dyn Error>> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sentences analyzed ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(progress_bar)
}

fn write_output(output: Option<&Path>, reports: &[SentenceReport]) -> Result<(), Box<dyn Error>> {
    let json_output = serde_json::to_string_pretty(reports)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_output.as_bytes())?;
            file.write_all(b"\n")?;
            info!("JSON output written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json_output.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
