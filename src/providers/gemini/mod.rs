#[allow(clippy::module_inception)]
pub mod gemini;

pub use gemini::GeminiProvider;
