//! Forward-index building binary.
//!
//! Reads a record collection from a file (or stdin) and writes the binary
//! forward index plus its `.documents`, `.urls`, and `.terms` sidecars.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin build-forward-index -- \
//!   --input ./collection.txt --output ./fwd --format plaintext \
//!   --batch-size 10000 --threads 8
//! ```

use fwdlens::{read_plaintext_record, ContentFormat, ForwardIndexBuilder};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone)]
struct Config {
    input: Option<PathBuf>,
    output: PathBuf,
    format: ContentFormat,
    batch_size: usize,
    threads: usize,
}

impl Config {
    fn from_args() -> Self {
        let mut input: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;
        let mut format = ContentFormat::Plaintext;
        let mut batch_size: usize = 10_000;
        let mut threads: usize = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);

        let args: Vec<String> = std::env::args().collect();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--input" => {
                    i += 1;
                    input = args.get(i).map(PathBuf::from);
                }
                "--output" => {
                    i += 1;
                    output = args.get(i).map(PathBuf::from);
                }
                "--format" => {
                    i += 1;
                    if let Some(parsed) = args.get(i).and_then(|s| s.parse().ok()) {
                        format = parsed;
                    }
                }
                "--batch-size" => {
                    i += 1;
                    batch_size = args
                        .get(i)
                        .and_then(|s| s.replace('_', "").parse().ok())
                        .unwrap_or(batch_size);
                }
                "--threads" => {
                    i += 1;
                    threads = args
                        .get(i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(threads);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            input,
            output: output.unwrap_or_else(|| PathBuf::from("./fwd")),
            format,
            batch_size,
            threads,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::from_args();

    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let stdin = io::stdin();
    let mut input: Box<dyn BufRead> = match &config.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin.lock()),
    };

    let builder = ForwardIndexBuilder::new(config.batch_size, config.threads)?;
    builder.build(
        &mut *input,
        &config.output,
        read_plaintext_record,
        config.format.splitter(),
        |term: String| term.to_lowercase(),
    )?;

    println!("Index written to {}", config.output.display());
    Ok(())
}
