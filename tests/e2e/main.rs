//! E2E test suite entry point.

mod config_workflow;
mod fixture;
mod mcp_workflow;
mod scenario_workflow;
