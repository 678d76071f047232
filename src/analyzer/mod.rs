//! Analysis engine for determining the change level of a release range

pub mod change_analyzer;

pub use change_analyzer::{ChangeAnalyzer, RangeAnalysis};
