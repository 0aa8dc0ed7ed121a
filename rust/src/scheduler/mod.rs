//! Resource leveling of detail tasks under a per-phase daily worker cap.
//!
//! Phases are leveled in canonical order; each phase gets its own capacity
//! profile, while placed spans are shared so phase windows chain correctly.

mod capacity;
mod core;
mod state;

pub use capacity::{Reservation, WorkerCapacity};
pub use core::ResourceLeveler;
pub use state::{link_bound, LevelerState, PlacedSpan};
