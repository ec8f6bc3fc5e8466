//! ConnectionRegistry の実装
//!
//! - `inmemory`: HashMap + Mutex によるプロセス内実装

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
