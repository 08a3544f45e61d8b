pub mod http;
pub mod logging;

pub use http::{bearer, HttpClient, HttpResponse, RemoteFetchError, DEFAULT_TIMEOUT_SECS};
pub use logging::init_logging;
