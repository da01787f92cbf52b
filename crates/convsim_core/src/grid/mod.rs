//! Parameter grid expansion.
//!
//! An experiment declares one list of values per swept parameter. The grid is
//! the Cartesian product of those lists, enumerated in row-major order with the
//! last dimension (`conversation_length`) varying fastest:
//!
//! ```ignore
//! use convsim_core::grid::ParameterGrid;
//!
//! let grid = ParameterGrid {
//!     altruism_prob: vec![0.0, 0.25, 0.5, 0.75],
//!     tau_margin: vec![0.02, 0.05, 0.1],
//!     ..Default::default()
//! };
//! grid.validate()?;
//! assert_eq!(grid.total_configurations(), 12);
//! for (index, config) in grid.configurations() {
//!     // ...
//! }
//! ```

mod indices;
mod parameters;

pub use indices::{GridIndices, compute_strides, flat_index, multi_index};
pub use parameters::{DIMENSIONS, ParameterGrid, VALUE_TOLERANCE};
