mod harness;
mod loop_tests;
