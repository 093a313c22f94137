use std::{fs::File, io::BufReader, path::Path};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Emission probability assumed for a word that never occurred in training.
pub const DEFAULT_OOV_EMISSION: f64 = 0.99;

bitflags! {
    /// Components that emit per-item traces through the `log` facade.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Verbosity: u8 {
        const TRAIN = 0x01;
        const DECODE = 0x02;
        const EVAL = 0x04;
    }
}

impl Verbosity {
    /// Maps a repeated `-v` flag count to traced components.
    pub fn from_occurrences(n: u8) -> Self {
        match n {
            0 => Self::empty(),
            1 => Self::TRAIN | Self::EVAL,
            _ => Self::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Placeholder P(word|tag) for out-of-vocabulary words during decoding.
    #[serde(default = "default_oov_emission")]
    pub oov_emission: f64,
    #[serde(default)]
    pub verbosity: Verbosity,
}

fn default_oov_emission() -> f64 {
    DEFAULT_OOV_EMISSION
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self { oov_emission: DEFAULT_OOV_EMISSION, verbosity: Verbosity::empty() }
    }
}

impl TaggerConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(f))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity |= verbosity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.oov_emission > 0.0 && self.oov_emission <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "oov_emission must lie in (0, 1], got {}",
                self.oov_emission
            )));
        }
        Ok(())
    }
}
