//! Integration tests against a mocked vendor API.

pub mod prediction_client_tests;
pub mod retry_tests;
