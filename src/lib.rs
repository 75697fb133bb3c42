//! Auto Specifics
//!
//! HTTP relay that turns an image URL into clothing item specifics: the image
//! is labelled by Google Cloud Vision and the labels are expanded into a JSON
//! description by an OpenAI chat model.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
