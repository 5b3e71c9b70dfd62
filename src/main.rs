use std::io;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info};

use collider::{
    Error, Folded, SearchConfig, SeedStream, StdoutSink, ZrHa, ZrHaWide, read_corpus, search,
};

/// Search for 64-bit hash collisions: read strings from stdin, then
/// re-hash the whole corpus under many random seeds and print every
/// group of inputs whose digests collide.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Worker threads.
    #[arg(short = 'j', long, default_value_t = 2)]
    threads: usize,

    /// Total number of trials (seeds) across all workers.
    #[arg(short = 'n', long, default_value_t = 64)]
    trials: u64,

    /// Hash construction to evaluate.
    #[arg(long, value_enum, default_value = "zrha")]
    hash: HashKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum HashKind {
    /// Two-lane multiply-rotate construction.
    Zrha,
    /// Three-state double-injection construction.
    ZrhaWide,
    /// foldhash adapter, the known-good reference.
    Fold,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let corpus = read_corpus(io::stdin().lock())?;
    info!(
        "corpus: {} strings in {} arena bytes",
        corpus.len(),
        corpus.arena_bytes()
    );

    let stream = SeedStream::from_entropy()?;
    let config = SearchConfig {
        trials: args.trials,
        threads: args.threads,
    };
    info!("running {} trials on {} threads", config.trials, config.threads);

    match args.hash {
        HashKind::Zrha => search::run(&corpus, &ZrHa, &StdoutSink, &config, stream),
        HashKind::ZrhaWide => search::run(&corpus, &ZrHaWide, &StdoutSink, &config, stream),
        HashKind::Fold => search::run(&corpus, &Folded, &StdoutSink, &config, stream),
    }
}
