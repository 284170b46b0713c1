//! Passes over parsed trees: generic traversal in [`walk`] and rewriting in
//! [`transform`], with the optimizer, the validator and a few utilities built
//! on top of them.

pub mod optimize;
pub mod transform;
pub mod utils;
pub mod validate;
pub mod walk;

pub use optimize::{
    fold_constants, inline_functions, optimize, remove_dead_code, remove_unused_variables,
    remove_unused_variables_with, OptimizeOptions,
};
pub use transform::{transform, transform_all, transform_post, transform_with, Action};
pub use utils::{is_equal, normalize, statistics, Statistics};
pub use validate::{validate, Validation};
pub use walk::{find_first, find_nodes, walk, walk_all, walk_with, Visit};
