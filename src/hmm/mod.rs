pub mod lattice;
pub mod model;
pub mod tagger;
pub mod trainer;
pub mod unknown;

pub use model::{HmmModel, Model};
pub use tagger::{HmmTagger, Tagger};
pub use trainer::HmmTrainer;
pub use unknown::{classify, classify_unknown};
