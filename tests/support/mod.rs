pub mod bridge_harness;
