//! Multi-tier interpretation of raw alert text into validated trade
//! intents bound to tradable instruments.

pub mod engine;
pub mod extraction;
pub mod ignore;
pub mod patterns;
pub mod validate;

pub use engine::InterpreterEngine;
pub use extraction::ExtractionClient;
pub use patterns::{ExtractedFields, FieldPatterns};
pub use validate::ResolvedIntent;
