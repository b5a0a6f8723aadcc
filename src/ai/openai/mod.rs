pub mod caption;
pub mod client;
pub mod text;
pub mod types;

pub use caption::OpenAiCaptionClient;
pub use text::OpenAiTextClient;
