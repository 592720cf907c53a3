use clap::Parser;
use mmlxml::musicxml::writer::{self, OutputOptions};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mmlxml")]
#[command(version = "0.1.0")]
#[command(about = "MML to MusicXML compiler", long_about = None)]
struct Args {
    /// Output directory for the per-channel score files
    output: PathBuf,

    /// Input MML file (reads from stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Base name of the output files
    #[arg(short, long, default_value = "score")]
    stem: String,

    /// Emit compact output without indentation
    #[arg(short, long)]
    minified: bool,

    /// Emit the document model as JSON instead of MusicXML
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), mmlxml::Error> {
    let args = Args::parse();

    let program = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let scores = mmlxml::compile(&program)?;

    let written = writer::write_scores(
        &scores,
        &args.output,
        &args.stem,
        OutputOptions {
            minified: args.minified,
            json: args.json,
        },
    )?;

    for (channel, path) in &written {
        let measures = scores[*channel]
            .as_ref()
            .map(|s| s.part.measures.len())
            .unwrap_or(0);
        println!("|  {:2}  |  {:8}  |  {}", channel, measures, path.display());
    }

    Ok(())
}
