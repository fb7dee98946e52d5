use std::{
    error::Error,
    fs,
    io::{self, Read, Write},
};

use dhalltype::{config::PipelineConfig, parser, printer, util::tree};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: dhall-strengthen [--config <config.yaml>] [--samples <sample.yaml>] [--tree] < type.dhall

Reads an inferred record type on stdin and writes the strengthened type to
stdout. Set RUST_LOG=dhalltype=debug to see which rewrites fired.";

#[derive(Default)]
struct Args {
    config: Option<String>,
    samples: Option<String>,
    tree: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run() {
        eprintln!("failed to run: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let Some(args) = parse_args()? else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => PipelineConfig::from_yaml(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    let samples = match &args.samples {
        Some(path) => {
            let document: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(path)?)?;
            config.collect_samples(&document)
        }
        None => config.empty_samples(),
    };
    let pipeline = config.build(samples)?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let ty = pipeline.run(parser::parse_in_new(&input)?);

    let output = if args.tree {
        tree::print_type_string(&ty)
    } else {
        printer::print_string(&ty, 0)
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;
    Ok(())
}

/// Returns `None` when usage was requested.
fn parse_args() -> Result<Option<Args>, Box<dyn Error>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--tree" => args.tree = true,
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?),
            "--samples" => args.samples = Some(iter.next().ok_or("--samples needs a path")?),
            other => return Err(format!("unknown argument {other:?}\n\n{USAGE}").into()),
        }
    }
    Ok(Some(args))
}
