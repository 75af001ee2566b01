//! Pattern database schema and loading.

pub mod loader;
#[cfg(test)]
mod loader_test;

pub use loader::*;
