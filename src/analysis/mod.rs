pub mod analyzer;
pub mod config;
pub mod summary;

pub use analyzer::{is_suspicious, ViolationAnalyzer};
pub use config::{AnalyzerConfig, ForbiddenPattern};
pub use summary::{DiagnosticsSummary, Verdict};
