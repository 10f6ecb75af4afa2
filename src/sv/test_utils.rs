//! Shared test utilities for database setup
