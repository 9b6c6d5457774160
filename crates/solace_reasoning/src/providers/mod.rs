pub mod mock;
pub mod ollama;

pub use mock::{ConfidenceSynthesizer, KeywordAnalyzer, TemplateResponder};
pub use ollama::OllamaResponder;
