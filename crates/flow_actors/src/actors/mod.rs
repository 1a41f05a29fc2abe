//! Built-in reference transformers

mod document_keys;
mod feature_generator;
mod named_setup;

pub use document_keys::{DocumentKeys, OPT_OUTPUT_ARRAY};
pub use feature_generator::{FeatureGenerator, OPT_ALGORITHM};
pub use named_setup::{NamedSetup, OPT_SETUP};
