/// Worked examples of every reasoning task on a small built-in rule base
pub mod reasoning_examples;
