use crate::batch::Variation;
use crate::contract::OptionContract;
use crate::error::InvalidOption;
use crate::models::bs::PutLeg;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contract written by the generator, in the same column vocabulary as the
/// input files. Defaults to a one-year call struck 10% below spot.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_option_type")]
    pub option_type: String,
    #[serde(default = "default_price")]
    pub price: f64,
    #[serde(default = "default_strike")]
    pub strike: f64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default = "default_time_to_maturity")]
    pub time_to_maturity: f64,
    #[serde(default = "default_amount_underlying")]
    pub amount_underlying: u32,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            option_type: default_option_type(),
            price: default_price(),
            strike: default_strike(),
            interest_rate: default_interest_rate(),
            volatility: default_volatility(),
            time_to_maturity: default_time_to_maturity(),
            amount_underlying: default_amount_underlying(),
        }
    }
}

impl TemplateConfig {
    pub fn to_contract(&self) -> Result<OptionContract, InvalidOption> {
        OptionContract::new(
            &self.option_type,
            self.price,
            self.strike,
            self.interest_rate,
            self.volatility,
            self.time_to_maturity,
            self.amount_underlying,
        )
    }
}

/// Settings for synthetic record generation
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Number of records to write
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub template: TemplateConfig,
    /// Relative spot jitter, `0.0` for identical records
    #[serde(default)]
    pub spot_jitter: f64,
    /// Random seed for reproducibility
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            template: TemplateConfig::default(),
            spot_jitter: 0.0,
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn variation(&self) -> Variation {
        Variation::spot_jitter(self.spot_jitter, self.seed)
    }
}

/// Main configuration struct for a batch run
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Option records to value; also where generated records are written
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Per-row results CSV; results are only summarised when absent
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Rows between progress log lines (0 = silent)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    #[serde(default)]
    pub put_leg: PutLeg,

    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: None,
            progress_interval: default_progress_interval(),
            put_leg: PutLeg::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Large jittered dataset for throughput measurements
    pub fn benchmark() -> Self {
        Self {
            progress_interval: 250_000,
            generation: GenerationConfig {
                count: 5_000_000,
                spot_jitter: 0.25,
                seed: Some(123456),
                ..GenerationConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid batch configuration")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config {}", path.display()))
    }
}

fn default_option_type() -> String {
    "call".to_string()
}

fn default_price() -> f64 {
    1.0
}

fn default_strike() -> f64 {
    0.9
}

fn default_interest_rate() -> f64 {
    0.015
}

fn default_volatility() -> f64 {
    0.2
}

fn default_time_to_maturity() -> f64 {
    1.0
}

fn default_amount_underlying() -> u32 {
    1
}

fn default_count() -> usize {
    1_000_000
}

fn default_input() -> PathBuf {
    PathBuf::from("option_examples.csv")
}

fn default_progress_interval() -> usize {
    100_000
}
