use std::{io::stdout, path::PathBuf};

use clap::Parser;
use hmmtag::{
    classify_unknown, dataset::write_sentence, Corpus, Evaluation, HmmModel, Model, Tagger,
    TaggerConfig, TestSet, Verbosity,
};

/// Assign part-of-speech tags to the words of the given files (FILE)
/// Evaluate the tagging against a manually tagged file (with -t option)
#[derive(Debug, Parser)]
struct Argv {
    /// read a model from a file (MODEL)
    #[arg(short, long, required = true, value_name = "MODEL")]
    model: PathBuf,
    /// report the accuracy of the model against a gold standard (GOLD)
    #[arg(short = 't', long = "test", value_name = "GOLD")]
    gold: Option<PathBuf>,
    /// suppress tagging results (useful for test mode)
    #[arg(short, long)]
    quiet: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(value_name = "FILE", required = true)]
    datasets: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("{:?}", argv);
    let config = TaggerConfig::default().with_verbosity(Verbosity::from_occurrences(argv.verbose));
    let model = HmmModel::from_path(&argv.model).expect("failed to load model");
    let mut tagger = model.tagger(&config);
    let mut prediction = Vec::new();
    let mut out = stdout().lock();
    for fpath in &argv.datasets {
        let test = TestSet::from_path(fpath).expect("failed to read the input data");
        tagger.set_unknown(classify_unknown(&test.unique_words(), &model));
        for sentence in &test.sentences {
            let tagged = tagger.tag(&sentence.words);
            let tokens = sentence.align(&tagged);
            if !argv.quiet {
                write_sentence(&mut out, tokens).expect("failed to write output");
            }
            prediction.extend_from_slice(tokens);
        }
    }
    if let Some(gold) = &argv.gold {
        let gold = Corpus::from_path(gold).expect("failed to read gold standard");
        let reference: Vec<_> = gold.tokens().cloned().collect();
        let mut evaluation = Evaluation::new(&config);
        evaluation.accumulate(&prediction, &reference).expect("failed to evaluate");
        println!("{}", evaluation);
    }
}
