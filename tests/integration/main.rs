//! End-to-end API tests over the full router with an in-memory store
//! and cache. No external services are required.

mod helpers;

mod health_test;
mod notification_test;
mod ws_test;
