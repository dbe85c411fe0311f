//! Orphaned networking resources for costsweep
//!
//! Unlike the cost-trend pipeline, this crate finds idle resources by their
//! state: network interfaces in the `available` status and elastic IPs
//! associated with neither an instance nor an interface. It scans every
//! region concurrently and can release individual resources.

pub mod cleanup;
pub mod inventory;
pub mod scanner;

pub use cleanup::{CleanupTarget, cleanup};
pub use inventory::{Ec2Inventory, NetworkCleaner, NetworkInventory, RegionDirectory};
pub use scanner::OrphanScanner;
