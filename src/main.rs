use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use hmmtag::{
    classify_unknown, dataset::write_sentence, Corpus, Evaluation, HmmTrainer, Model, Tagger,
    TaggerConfig, TestSet, Verbosity,
};

/// Train a bigram HMM on a tagged corpus (TRAIN), tag a test file (TEST) with
/// the Viterbi algorithm and evaluate the result against a gold standard (GOLD)
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// tagged training corpus (word/tag entries)
    #[arg(long = "tr", visible_alias = "train", value_name = "TRAIN")]
    train: PathBuf,
    /// text to tag (plain words)
    #[arg(long = "ts", visible_alias = "test", value_name = "TEST")]
    test: PathBuf,
    /// manually tagged version of the test text
    #[arg(long = "tk", visible_alias = "key", value_name = "GOLD")]
    gold: Option<PathBuf>,
    /// where to write the tagged text
    #[arg(short, long, default_value = "tagging-output")]
    output: PathBuf,
    /// where to write the confusion matrix
    #[arg(long, default_value = "conf_matrix.csv")]
    confusion: PathBuf,
    /// also save the trained model (JSON)
    #[arg(short, long)]
    model: Option<PathBuf>,
    /// tagger configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(argv: &Argv) -> hmmtag::Result<()> {
    let config = match &argv.config {
        Some(path) => TaggerConfig::from_path(path)?,
        None => TaggerConfig::default(),
    }
    .with_verbosity(Verbosity::from_occurrences(argv.verbose));

    let begin = Instant::now();
    let corpus = Corpus::from_path(&argv.train)?;
    log::info!("read {} sentences ({} items) from {:?}", corpus.len(), corpus.total_items(), argv.train);
    let mut trainer = HmmTrainer::new(&config);
    trainer.append_corpus(&corpus);
    let model = trainer.train()?;
    if let Some(path) = &argv.model {
        model.save(path)?;
        log::info!("write model to {:?}", path);
    }

    let test = TestSet::from_path(&argv.test)?;
    let unknown = classify_unknown(&test.unique_words(), &model);
    let mut tagger = model.tagger(&config).with_unknown(unknown);
    let mut out = BufWriter::new(File::create(&argv.output)?);
    let mut prediction = Vec::new();
    for sentence in &test.sentences {
        let tagged = tagger.tag(&sentence.words);
        let tokens = sentence.align(&tagged);
        write_sentence(&mut out, tokens)?;
        prediction.extend_from_slice(tokens);
    }
    out.flush()?;
    log::info!(
        "tagged {} sentences ({} tokens) into {:?}, took: {:?}",
        test.len(),
        prediction.len(),
        argv.output,
        begin.elapsed()
    );

    if let Some(path) = &argv.gold {
        let gold = Corpus::from_path(path)?;
        let reference: Vec<_> = gold.tokens().cloned().collect();
        let mut evaluation = Evaluation::new(&config);
        evaluation.accumulate(&prediction, &reference)?;
        println!("{}", evaluation);
        evaluation.confusion().write_csv(File::create(&argv.confusion)?)?;
        log::info!("write confusion matrix to {:?}", argv.confusion);
    }
    Ok(())
}

fn main() -> ExitCode {
    let argv = Argv::parse();
    let level = match argv.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::debug!("{:?}", argv);
    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
