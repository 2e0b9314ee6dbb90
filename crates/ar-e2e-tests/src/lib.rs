//! End-to-end tests for the atomic router live in `tests/`.
