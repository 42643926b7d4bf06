// Library interface for reviewscope modules
// This allows tests and the binaries to import modules

pub mod keywords;
pub mod sentiment;
pub mod review;
pub mod summary;
pub mod strategy;
pub mod llm;
pub mod scraping;
pub mod storage;
pub mod pipeline;
