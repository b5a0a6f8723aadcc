pub mod caption;
pub mod client;
pub mod text;
pub mod types;

pub use caption::GeminiCaptionClient;
pub use text::GeminiTextClient;
