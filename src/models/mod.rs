pub mod generation;
pub mod job;
pub mod lead;
pub mod prediction;
