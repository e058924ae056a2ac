// # Output Store Implementations
//
// This module provides implementations of the OutputStore trait for
// different destinations.

pub mod file;
pub mod memory;

pub use file::FileOutputStore;
pub use memory::MemoryOutputStore;
