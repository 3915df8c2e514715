//! Research workflow: planning, coordination, and synthesis

pub mod coordinator;
pub mod planner;
pub mod synthesizer;

pub use coordinator::ResearchCoordinator;
pub use planner::ResearchPlanner;
pub use synthesizer::ResearchSynthesizer;
