// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Persistent storage backends
//!
//! Trait-based abstractions for ordered key-value storage, allowing different
//! backends (Sled, in-memory) to hold the version chains interchangeably.
//!
//! # Architecture
//!
//! ```text
//! ChainedVersionStore (version chains per record key)
//!     ↓
//! StorageDriver / StorageTree (ordered key-value abstraction)
//!     ↓
//! Concrete Implementations (Sled, Memory)
//! ```

// Core modules
pub mod factory;
pub mod traits;
pub mod types;

// Driver implementations
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;

// Public API re-exports
pub use factory::{create_storage_driver, BoxedStorageDriver};
pub use memory::{MemoryStorageDriver, MemoryTree};
pub use traits::{BatchOp, KvIter, StorageDriver, StorageTree, WriteBatch};
pub use types::{StorageDriverError, StorageResult, StorageType};
