//! REST adapters for the initial snapshot load.

mod snapshot_loader;

pub use snapshot_loader::HttpSnapshotLoader;
