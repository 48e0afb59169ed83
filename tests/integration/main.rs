//! Integration tests for Shoal
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! coordinator through complete crawl runs.

mod crawl_tests;
