//! Target resolution (SPEC_FULL §4.13 supplement). Grounded in the
//! original source's `host/control/desired_position.py`, which resolves
//! a named target to alt/az via astropy/astroquery. No astronomy crate
//! appears in the dependency pack, so this module defines the seam as a
//! trait and ships a small fixed-catalog implementation rather than
//! fabricating an ephemeris dependency.

use std::collections::HashMap;

use crate::error::ResolveError;

/// A resolved horizontal-coordinate target at the moment of the call.
/// `visible` is `alt_deg > 0` at the observer's location (spec §4.7:
/// "refuse if the object is not visible (alt ≤ 0)").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTarget {
    pub alt_deg: f64,
    pub az_deg: f64,
    pub visible: bool,
}

/// Injection point for turning a target name into alt/az at a given
/// observer location. The tracking loop (host/tracker.rs) calls this
/// once per tick; any error is treated identically (skip this tick,
/// log, retry next tick).
pub trait TargetResolver: Send {
    fn resolve(&self, name: &str, lat_deg: f64, lon_deg: f64, elev_m: f64) -> Result<ResolvedTarget, ResolveError>;
}

/// Fixed lookup table of named alt/az pairs, usable for local testing
/// and `--simulate` runs where no ephemeris backend is wired up.
/// `lat_deg`/`lon_deg`/`elev_m` are accepted to match the trait's shape
/// but ignored: a real resolver would use them to convert a catalog
/// RA/Dec into the observer's horizontal coordinates.
#[derive(Debug, Default)]
pub struct FixedCatalogResolver {
    entries: HashMap<String, (f64, f64)>,
}

impl FixedCatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, alt_deg: f64, az_deg: f64) -> Self {
        self.entries.insert(name.into(), (alt_deg, az_deg));
        self
    }
}

impl TargetResolver for FixedCatalogResolver {
    fn resolve(&self, name: &str, _lat_deg: f64, _lon_deg: f64, _elev_m: f64) -> Result<ResolvedTarget, ResolveError> {
        let (alt_deg, az_deg) = self
            .entries
            .get(name)
            .copied()
            .ok_or_else(|| ResolveError::UnknownTarget(name.to_string()))?;
        Ok(ResolvedTarget {
            alt_deg,
            az_deg,
            visible: alt_deg > 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_target_resolves() {
        let resolver = FixedCatalogResolver::new().with_entry("polaris", 89.3, 0.0);
        let target = resolver.resolve("polaris", 0.0, 0.0, 0.0).unwrap();
        assert_eq!(target.alt_deg, 89.3);
        assert!(target.visible);
    }

    #[test]
    fn target_below_horizon_is_not_visible() {
        let resolver = FixedCatalogResolver::new().with_entry("below", -5.0, 0.0);
        let target = resolver.resolve("below", 0.0, 0.0, 0.0).unwrap();
        assert!(!target.visible);
    }

    #[test]
    fn unknown_target_errors() {
        let resolver = FixedCatalogResolver::new();
        assert!(matches!(resolver.resolve("nowhere", 0.0, 0.0, 0.0), Err(ResolveError::UnknownTarget(_))));
    }
}
