//! Adapters for the two consumed Google HTTP contracts: Search Console
//! search analytics and Gemini batched intent classification.

pub mod gemini;
pub mod search_console;

pub use gemini::GeminiClient;
pub use search_console::SearchConsoleClient;
