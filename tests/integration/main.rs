//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem end to end
//! against mock adapters. All tests run on the host with no real GPIO
//! required.

mod command_flow_tests;
mod maintained_call_tests;
mod mock_hw;
