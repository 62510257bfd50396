pub mod test_harness;

pub use test_harness::*;
