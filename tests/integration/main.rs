//! Integration tests for Word-Tally
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! pipeline end to end.

mod pipeline_tests;
