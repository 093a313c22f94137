use std::path::PathBuf;

use clap::Parser;
use hmmtag::{Corpus, HmmTrainer, TaggerConfig, Verbosity};

/// Estimate an HMM from tagged corpora (DATASETS) and store it in MODEL
#[derive(Debug, Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Argv {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// write the model to a file (MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: PathBuf,
    /// tagger configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(required = true)]
    datasets: Vec<PathBuf>,
}

fn main() {
    env_logger::init();

    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    let config = argv
        .config
        .as_ref()
        .map(TaggerConfig::from_path)
        .transpose()
        .expect("failed to read config")
        .unwrap_or_default()
        .with_verbosity(Verbosity::from_occurrences(argv.verbose));
    let mut trainer = HmmTrainer::new(&config);
    argv.datasets.iter().for_each(|fpath| {
        let corpus = Corpus::from_path(fpath).expect("failed to read dataset");
        log::info!("read {} items from {:?}", corpus.total_items(), fpath);
        trainer.append_corpus(&corpus);
    });
    let model = trainer.train().expect("failed to train");
    model.save(&argv.model).expect("failed to write model");
    log::info!("write model to {:?}", argv.model);
}
