//! End-to-end tests for the load generator and metrics collector live in `tests/`.
