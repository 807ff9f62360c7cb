//! Classification services
//!
//! Ingestion, prompt construction, the classifier providers and the batch
//! runner that ties them together.

pub mod batch_runner;
pub mod classifier;
pub mod csv_ingestor;
pub mod gemini_client;
pub mod groq_client;
pub mod keyword_classifier;
pub mod prompt;
pub mod rate_limiter;

pub use batch_runner::{BatchOutcome, BatchRunner, BatchSettings, BatchStats};
pub use classifier::{normalize_response, Classifier, FallbackClassifier};
pub use csv_ingestor::{ingest, TabularFormat};
pub use gemini_client::GeminiClient;
pub use groq_client::GroqClient;
pub use keyword_classifier::KeywordClassifier;
pub use rate_limiter::RateLimiter;
