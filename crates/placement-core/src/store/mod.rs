//! 저장소 구현.

mod memory;

pub use memory::MemoryStore;
