//! Tests for command execution, dry-run, redaction, and piping.

mod chain;
