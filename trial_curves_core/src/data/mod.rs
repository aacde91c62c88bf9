//! Trial datasets: file loading and synthetic generation.

pub mod trial_dataset;

pub use trial_dataset::{SyntheticConfig, Trial, TrialDataset, TrialSchema};
