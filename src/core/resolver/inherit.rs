// ─── Inheritance ───
// Walks `inheritsFrom` chains over the profile store and folds them into
// one profile.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::core::error::LauncherResult;
use crate::core::version::{Platform, Profile, ProfileStore};

use super::merge::merge_profiles;
use super::natives::filter_libraries_for_platform;

pub const MAX_INHERITANCE_DEPTH: usize = 6;

/// `[requested, parent, grandparent, ...]`.
///
/// `Ok(None)` when the requested profile or any ancestor is missing, the
/// chain is deeper than `max_depth`, or it loops back on itself.
pub fn load_chain(
    store: &mut ProfileStore,
    version_id: &str,
    max_depth: usize,
) -> LauncherResult<Option<Vec<Profile>>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(version_id.to_string());

    while let Some(id) = next.take() {
        if chain.len() > max_depth {
            warn!("Inheritance chain of {} exceeds depth {}", version_id, max_depth);
            return Ok(None);
        }
        if !seen.insert(id.clone()) {
            warn!("Inheritance cycle at {} while resolving {}", id, version_id);
            return Ok(None);
        }
        let Some(profile) = store.load(&id)? else {
            warn!("Profile {} not found while resolving {}", id, version_id);
            return Ok(None);
        };
        next = profile.parent_id().map(str::to_string);
        chain.push(profile);
    }

    Ok(Some(chain))
}

/// Fold a chain (child first) into one profile, root ancestor as the base.
pub fn merge_chain(chain: &[Profile]) -> Option<Profile> {
    let mut iter = chain.iter().rev();
    let mut merged = iter.next()?.clone();
    for child in iter {
        merged = merge_profiles(&merged, child);
    }
    Some(merged)
}

/// Resolve `version_id` into a single profile.
///
/// Loader-launcher profiles (Fabric/Quilt) and profiles without a parent
/// come back untouched. Otherwise the chain is merged and the libraries are
/// filtered for `platform`; the result still carries the child's
/// `inheritsFrom` pointer. Chains deeper than `max_depth` yield `None`.
pub fn resolve_inheritance(
    store: &mut ProfileStore,
    version_id: &str,
    platform: &Platform,
    max_depth: usize,
) -> LauncherResult<Option<Profile>> {
    let Some(own) = store.load(version_id)? else {
        return Ok(None);
    };
    if own.is_loader_launcher() {
        debug!("{} uses a loader launcher, keeping it unflattened", version_id);
        return Ok(Some(own));
    }
    if own.parent_id().is_none() {
        return Ok(Some(own));
    }

    let Some(chain) = load_chain(store, version_id, max_depth)? else {
        return Ok(None);
    };
    let Some(mut merged) = merge_chain(&chain) else {
        return Ok(None);
    };
    merged.libraries = filter_libraries_for_platform(merged.libraries, platform);
    Ok(Some(merged))
}
