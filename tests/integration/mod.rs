//! Integration tests for the handoff pipeline against real git repositories

mod build_scenarios;
mod cli_contracts;
mod detail_resolution;
mod persistence;
