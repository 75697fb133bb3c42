pub mod analyze;
pub mod credentials;
