pub mod coordinator;
pub mod decompression;
pub mod linker;
pub mod manifest_store;
pub mod planner;
pub mod registry;
pub mod sync;
