//! flatpage-region - Connected components and seed filling
//!
//! - [`find_connected_components`] labels 4- or 8-connected foreground
//!   and returns each component with its bounding box and mask
//! - [`seedfill_binary`] reconstructs the mask components touched by a seed

pub mod conncomp;
mod error;
pub mod seedfill;

pub use conncomp::{
    ConnectedComponent, ConnectivityType, find_connected_components, label_connected_components,
};
pub use error::{RegionError, RegionResult};
pub use seedfill::{remove_seeded_components, seedfill_binary};
