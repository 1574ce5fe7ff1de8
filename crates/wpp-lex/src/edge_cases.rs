//! Edge case tests for wpp-lex
