//! Snapshot tests entry point.

mod template_snapshots;
