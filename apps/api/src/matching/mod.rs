// Skill-Matching Core
// Pipeline: taxonomy → extractor (resume and job, independently) → matcher → assembler.
// Only handlers touch I/O; the rest works on documents already resolved by the store.

pub mod assembler;
pub mod cache;
pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod matcher;
pub mod normalize;
pub mod taxonomy;
pub mod vocabulary;
