//! Integration tests for the broker.

mod helpers;
mod oauth_test;
mod sparql_test;
mod ws_test;
