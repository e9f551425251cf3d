pub mod gemini;
pub mod media;

pub use gemini::GeminiEmojiClient;
