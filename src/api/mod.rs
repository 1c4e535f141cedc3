mod client;
mod image_host;

pub use client::ApiClient;
pub use image_host::ImageHostClient;
