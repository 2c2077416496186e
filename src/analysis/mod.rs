pub mod file_metrics;
pub mod structure;
pub mod code_analyzer;
pub mod commit_patterns;
pub mod profile_generator;
pub mod similarity;
pub mod directory;
pub mod pipeline;

pub use code_analyzer::{AnalysisStage, CodeAnalyzer};
pub use commit_patterns::CommitPatternAnalyzer;
pub use directory::EngineerDirectory;
pub use file_metrics::FileMetricAnalyzer;
pub use pipeline::AnalysisPipeline;
pub use profile_generator::ProfileGenerator;
pub use structure::StructureScanner;
