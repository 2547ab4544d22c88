//! Closest variant selection
//!
//! A dependency names a bundle, optionally a theme and a minimum version.
//! Among the variants of that name, candidates must satisfy the minimum
//! version. With an explicit version the lowest satisfying variant wins,
//! otherwise the highest. A themed request that finds nothing falls back to
//! the default theme.

use crate::context::ResolverContext;
use bundlefile_core::{Bundle, BundleKey, DependencyRef, FileSystem, DEFAULT_THEME};
use std::cmp::Ordering;

/// Find the variant of `candidates` closest to `request`.
///
/// Only variants owned by the request's target document are considered when
/// `same_owner` is set. Returns the index of the chosen variant.
pub fn find_closest(request: &DependencyRef, candidates: &[Bundle], same_owner: bool) -> Option<usize> {
    let mut matching: Vec<(usize, &Bundle)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, b)| b.name.name == request.name)
        .filter(|(_, b)| !same_owner || b.owner == request.target)
        .filter(|(_, b)| b.version.satisfies(&request.version))
        .collect();

    if matching.is_empty() {
        return None;
    }

    let ascending = request.version.is_constrained();
    matching.sort_by(|(_, a), (_, b)| {
        let order = a.version.compare(&b.version);
        if ascending {
            order
        } else {
            order.reverse()
        }
    });

    let wanted = request.theme.as_deref();
    if let Some((index, _)) = matching.iter().find(|(_, b)| b.theme.as_deref() == wanted) {
        return Some(*index);
    }

    if wanted != Some(DEFAULT_THEME) {
        return find_closest(&request.with_default_theme(), candidates, same_owner);
    }
    None
}

/// Check if `a` is strictly newer than `b`
pub(crate) fn is_newer(a: &Bundle, b: &Bundle) -> bool {
    a.version.compare(&b.version) == Ordering::Greater
}

impl<F: FileSystem> ResolverContext<F> {
    /// Resolve a dependency reference to the key of its closest variant
    pub fn find_closest(&self, request: &DependencyRef) -> Option<BundleKey> {
        let document = self.document(request.target)?;
        let candidates = document.variants(&request.name);
        find_closest(request, candidates, true)
            .map(|index| BundleKey::new(request.target, request.name.clone(), index))
    }
}
