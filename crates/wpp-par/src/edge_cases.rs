//! Edge case tests for wpp-par
