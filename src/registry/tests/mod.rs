//! Tests for machine resolution and command templating.

mod docker;
mod ssh;
mod transfer;
