pub mod answers;
pub mod attempts;
pub mod learners;
pub mod sessions;
pub mod stats;
pub mod vocabulary;
