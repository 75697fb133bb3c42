pub mod credentials;
pub mod fetch;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod vision;
