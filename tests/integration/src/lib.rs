//! End-to-end tests for useradm live under `tests/`.
