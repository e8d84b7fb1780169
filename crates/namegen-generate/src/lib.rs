//! Name generation for newly created records.
//!
//! A [`NameGenerator`] is built once per name expression and owning table.
//! Each import batch opens a [`GenerationState`] that tracks the names issued
//! so far, memoizes lookups and draws counters; rows are named one at a time
//! through [`GenerationState::next_name`] or in bulk through
//! [`NameGenerator::generate_names`]. [`validate_expression`] reports
//! problems with an expression and renders a preview name without touching
//! any counter.

pub mod analysis;
mod context;
pub mod errors;
pub mod generator;
pub mod lineage;
pub mod lookup;
pub mod state;
pub mod validation;

pub use analysis::{AnalysisResult, LookupBinding, analyze};
pub use errors::{NameGenError, Result};
pub use generator::{
    BatchOptions, DEFAULT_COUNTER_PREFIX, NAME_KEY, NameGenerator, NameGeneratorBuilder,
    StateOptions,
};
pub use lineage::{DATA_INPUTS, INPUTS, MATERIAL_INPUTS, Parents, parent_names};
pub use lookup::{InMemoryLookupResolver, LookupError, LookupResolver};
pub use state::GenerationState;
pub use validation::{ValidationReport, validate_expression};
