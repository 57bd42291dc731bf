// ─── Profile Resolver ───
// Inheritance merging, platform filtering, argument cleanup and flattening.

mod args;
mod flatten;
mod inherit;
mod merge;
mod natives;

pub use args::{dedupe_singleton_args, dedupe_tokens, SINGLETON_FLAGS};
pub use flatten::{build_flat_profile, flatten_profile, FLAT_SUFFIX};
pub use inherit::{load_chain, merge_chain, resolve_inheritance, MAX_INHERITANCE_DEPTH};
pub use merge::{library_key, library_score, merge_arguments, merge_libraries, merge_profiles};
pub use natives::filter_libraries_for_platform;
