//! Read-only catalog of techniques and presets.
//!
//! Loaded once at startup from the built-ins plus any custom entries in the
//! settings file, validated as a whole, then shared by `Arc`.

pub mod builtin;
mod preset;
mod rank;
mod technique;

use std::collections::HashSet;
use std::sync::Arc;

pub use preset::{Preset, Segment};
pub use rank::{FilterKey, FALLBACK_RANK};
pub use technique::{AudioProfile, BreathAction, PhaseStep, Technique, VibrationPattern};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Catalog {
    techniques: Vec<Arc<Technique>>,
    presets: Vec<Arc<Preset>>,
}

impl Catalog {
    /// Build a catalog, validating every technique and preset.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for an empty technique list, duplicate ids,
    /// an invalid technique, or a preset that references an unknown technique.
    pub fn new(techniques: Vec<Technique>, presets: Vec<Preset>) -> Result<Self, ConfigError> {
        if techniques.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for technique in &techniques {
            if !seen.insert(technique.id.as_str()) {
                return Err(ConfigError::DuplicateId(technique.id.clone()));
            }
            technique.validate()?;
        }

        let mut seen_presets = HashSet::new();
        for preset in &presets {
            if !seen_presets.insert(preset.id.as_str()) {
                return Err(ConfigError::DuplicateId(preset.id.clone()));
            }
            preset.validate(|id| seen.contains(id))?;
        }

        Ok(Self {
            techniques: techniques.into_iter().map(Arc::new).collect(),
            presets: presets.into_iter().map(Arc::new).collect(),
        })
    }

    /// The built-in catalog. Its validity is covered by the tests below.
    pub fn builtin() -> Self {
        Self {
            techniques: builtin::techniques().into_iter().map(Arc::new).collect(),
            presets: builtin::presets().into_iter().map(Arc::new).collect(),
        }
    }

    /// Built-ins overlaid with custom entries; a custom entry replaces a
    /// built-in with the same id.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the merged catalog is invalid.
    pub fn with_custom(custom: Vec<Technique>, custom_presets: Vec<Preset>) -> Result<Self, ConfigError> {
        let techniques = overlay(builtin::techniques(), custom, |t| t.id.clone());
        let presets = overlay(builtin::presets(), custom_presets, |p| p.id.clone());
        Self::new(techniques, presets)
    }

    pub fn techniques(&self) -> &[Arc<Technique>] {
        &self.techniques
    }

    pub fn presets(&self) -> &[Arc<Preset>] {
        &self.presets
    }

    /// # Errors
    /// Returns [`ConfigError::UnknownTechnique`] if no technique has this id.
    pub fn technique(&self, id: &str) -> Result<Arc<Technique>, ConfigError> {
        self.techniques
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTechnique(id.to_string()))
    }

    /// # Errors
    /// Returns [`ConfigError::UnknownPreset`] if no preset has this id.
    pub fn preset(&self, id: &str) -> Result<Arc<Preset>, ConfigError> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownPreset(id.to_string()))
    }

    /// Techniques ordered for a filter string: by rank, then name.
    ///
    /// An unknown filter ranks everything at [`FALLBACK_RANK`], which leaves
    /// the list in name order.
    pub fn ranked(&self, filter: &str) -> Vec<Arc<Technique>> {
        let key = filter.parse::<FilterKey>().ok();
        let rank = |t: &Technique| key.map_or(FALLBACK_RANK, |k| t.rank(k));
        let mut out = self.techniques.clone();
        out.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name)));
        out
    }

    /// Techniques explicitly ranked under `filter`, in rank order.
    pub fn matching(&self, filter: FilterKey) -> Vec<Arc<Technique>> {
        let mut out: Vec<_> = self
            .techniques
            .iter()
            .filter(|t| t.ranks.contains_key(&filter))
            .cloned()
            .collect();
        out.sort_by_key(|t| t.rank(filter));
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn overlay<T>(base: Vec<T>, custom: Vec<T>, id: impl Fn(&T) -> String) -> Vec<T> {
    let custom_ids: HashSet<String> = custom.iter().map(&id).collect();
    base.into_iter()
        .filter(|item| !custom_ids.contains(&id(item)))
        .chain(custom)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        assert!(Catalog::new(builtin::techniques(), builtin::presets()).is_ok());
        let c = Catalog::builtin();
        assert!(c.technique("box").is_ok());
        assert!(c.preset("wind-down").is_ok());
        assert_eq!(c.technique("box").unwrap().steps.len(), 4);
    }

    #[test]
    fn unknown_ids_are_config_errors() {
        let c = Catalog::builtin();
        assert_eq!(
            c.technique("nope").unwrap_err(),
            ConfigError::UnknownTechnique("nope".into())
        );
        assert_eq!(
            c.preset("nope").unwrap_err(),
            ConfigError::UnknownPreset("nope".into())
        );
    }

    #[test]
    fn rejects_preset_with_unknown_technique() {
        let t = Technique::new("a", "A", vec![PhaseStep::new(BreathAction::Inhale, 1000)]);
        let p = Preset::new("p", "P", vec![Segment::new("b", 10)]);
        assert_eq!(
            Catalog::new(vec![t], vec![p]).unwrap_err(),
            ConfigError::UnknownTechnique("b".into())
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let t = Technique::new("a", "A", vec![PhaseStep::new(BreathAction::Inhale, 1000)]);
        assert_eq!(
            Catalog::new(vec![t.clone(), t], vec![]).unwrap_err(),
            ConfigError::DuplicateId("a".into())
        );
    }

    #[test]
    fn rejects_empty_catalog() {
        assert_eq!(Catalog::new(vec![], vec![]).unwrap_err(), ConfigError::EmptyCatalog);
    }

    #[test]
    fn custom_technique_replaces_builtin() {
        let custom = Technique::new("box", "My Box", vec![PhaseStep::new(BreathAction::Inhale, 3000)]);
        let c = Catalog::with_custom(vec![custom], vec![]).unwrap();
        assert_eq!(c.technique("box").unwrap().name, "My Box");
        assert_eq!(
            c.techniques().len(),
            Catalog::builtin().techniques().len()
        );
    }

    #[test]
    fn ranked_orders_by_rank_then_name() {
        let c = Catalog::builtin();
        let sleep = c.ranked("sleep");
        assert_eq!(sleep[0].id, "4-7-8");
        assert_eq!(sleep[1].id, "coherent");
        // unranked techniques trail in name order
        let tail: Vec<_> = sleep[2..].iter().map(|t| t.name.clone()).collect();
        let mut sorted = tail.clone();
        sorted.sort();
        assert_eq!(tail, sorted);
    }

    #[test]
    fn unknown_filter_falls_back_to_name_order() {
        let c = Catalog::builtin();
        let names: Vec<_> = c.ranked("trending").iter().map(|t| t.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn matching_only_returns_ranked_techniques() {
        let c = Catalog::builtin();
        let energy: Vec<_> = c.matching(FilterKey::Energy).iter().map(|t| t.id.clone()).collect();
        assert_eq!(energy, vec!["power", "triangle"]);
    }
}
