mod http;
pub mod types;

pub use http::{start_http_server, HttpState};
