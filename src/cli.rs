use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Sentences to analyze (read from --input or stdin when omitted)
    pub sentences: Vec<String>,

    /// Pattern database (*.json or *.bincode.zst artifact)
    #[arg(short, long, default_value = "resources/idioms/patterns.json")]
    pub patterns: PathBuf,

    /// File with one sentence per line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of idioms reported per sentence
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Report HTML phrase and definition variants
    #[arg(long)]
    pub html: bool,

    /// Report the matched token and character span
    #[arg(long)]
    pub span: bool,

    /// Report the entry's location in the source dictionary
    #[arg(long)]
    pub debug_range: bool,

    /// Report the pattern id
    #[arg(long)]
    pub debug_id: bool,

    /// Time budget for annotating one sentence, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Matcher configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
