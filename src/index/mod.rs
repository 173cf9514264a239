//! Index module for vecdex.
//!
//! Provides the `VectorIndex` trait, distance functions, the flat and
//! IVF-Flat implementations, the `VectorIndexHandle` enum over them, and the
//! `IndexFactory` that builds handles.

pub(crate) mod candidate;
pub mod distance;
pub mod factory;
pub mod flat;
pub mod handle;
pub mod ivf_flat;
pub mod traits;

pub use factory::IndexFactory;
pub use flat::FlatIndex;
pub use handle::VectorIndexHandle;
pub use ivf_flat::IvfFlatIndex;
pub use traits::VectorIndex;
