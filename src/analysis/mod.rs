//! Analysis module - knee detection and property extraction

mod extractor;
mod knee;

pub use extractor::{AnalysisError, MaterialProperties, PropertyExtractor, SampleAnalysis};
pub use knee::find_knee;
