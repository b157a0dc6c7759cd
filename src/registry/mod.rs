//! Node Schema Registry
//!
//! Discovers node operations and keeps their schemas in memory.
//! Nodepacks are read from disk in this layout:
//! ```text
//! {nodepacks}/
//!   ├── math/
//!   │   └── ops.py          # every public top-level def is a node
//!   ├── text/
//!   │   └── ops.py
//!   └── __pycache__/        # skipped, as is any __-prefixed directory
//! ```

mod schemas;

pub use schemas::SchemaRegistry;
