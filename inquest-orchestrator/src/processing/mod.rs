//! Synthesis post-processing: citation consolidation, source tracking,
//! and final report assembly.

pub mod citation;
pub mod formatter;
pub mod source_tracker;

pub use citation::{CitationEntry, CitationProcessor, DeduplicationResult};
pub use formatter::ResultFormatter;
pub use source_tracker::{SourceStatistics, SourceTracker};
