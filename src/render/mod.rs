//! External render provider adapters.

pub mod http;

pub use http::HttpRenderProvider;
