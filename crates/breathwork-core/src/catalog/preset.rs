use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One leg of a preset: play `technique_id` for `duration_secs` session seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub technique_id: String,
    pub duration_secs: u64,
}

impl Segment {
    pub fn new(technique_id: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            technique_id: technique_id.into(),
            duration_secs,
        }
    }
}

/// A finite program over existing techniques, played back-to-back as one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub segments: Vec<Segment>,
}

impl Preset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            segments,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check segment shape and that every referenced technique exists.
    ///
    /// # Errors
    /// Returns the first violation: no segments, a zero-length segment or a
    /// technique id for which `known` returns false.
    pub fn validate(&self, known: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptySegments {
                preset: self.id.clone(),
            });
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.duration_secs == 0 {
                return Err(ConfigError::ZeroSegmentDuration {
                    preset: self.id.clone(),
                    index,
                });
            }
            if !known(&segment.technique_id) {
                return Err(ConfigError::UnknownTechnique(segment.technique_id.clone()));
            }
        }
        Ok(())
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_technique() {
        let p = Preset::new("p", "P", vec![Segment::new("box", 60), Segment::new("ghost", 30)]);
        assert_eq!(
            p.validate(|id| id == "box"),
            Err(ConfigError::UnknownTechnique("ghost".into()))
        );
    }

    #[test]
    fn rejects_zero_segment() {
        let p = Preset::new("p", "P", vec![Segment::new("box", 0)]);
        assert!(matches!(
            p.validate(|_| true),
            Err(ConfigError::ZeroSegmentDuration { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_empty_preset() {
        let p = Preset::new("p", "P", vec![]);
        assert!(matches!(p.validate(|_| true), Err(ConfigError::EmptySegments { .. })));
    }

    #[test]
    fn total_duration_sums_segments() {
        let p = Preset::new("p", "P", vec![Segment::new("a", 5), Segment::new("b", 3)]);
        assert_eq!(p.total_duration_secs(), 8);
    }
}
