use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hmmtag::{Corpus, HmmTrainer, TaggerConfig};

const WORDS: [(&str, &str); 12] = [
    ("the", "DT"), ("a", "DT"), ("dog", "NN"), ("cat", "NN"), ("board", "NN"), ("runs", "VBZ"),
    ("joins", "VBZ"), ("old", "JJ"), ("quickly", "RB"), ("Pierre", "NNP"), ("61", "CD"), (",", ","),
];

/// Deterministic pseudo-random tagged corpus.
fn corpus(n_sentences: usize) -> String {
    let mut s = String::new();
    let mut x: usize = 17;
    for _ in 0..n_sentences {
        for _ in 0..(5 + x % 20) {
            x = x.wrapping_mul(1103515245).wrapping_add(12345) % (1 << 31);
            let (w, t) = WORDS[x % WORDS.len()];
            s.push_str(&format!("{w}/{t} "));
        }
        s.push_str("./.\n");
    }
    s
}

fn train(text: &str) {
    let mut trainer = HmmTrainer::new(&TaggerConfig::default());
    trainer.append_corpus(&Corpus::from(text));
    trainer.train().expect("failed to train");
}

fn train_benchmark(c: &mut Criterion) {
    let text = corpus(2000);
    c.bench_function("train", |b| b.iter(|| train(black_box(&text))));
}

criterion_group!(benchmarks, train_benchmark);
criterion_main!(benchmarks);
