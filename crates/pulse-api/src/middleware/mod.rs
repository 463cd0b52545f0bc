//! HTTP middleware: request correlation, request logging, and rate
//! limiting.

pub mod logging;
pub mod rate_limit;
pub mod request_id;
