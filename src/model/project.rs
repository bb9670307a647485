use serde::Serialize;

use super::track::{Track, TrackId};
use super::warning::Warning;

/// Ticks per quarter note used for all musical-position arithmetic
pub const TICKS_PER_QUARTER: i64 = 960;

/// A time signature such as 4/4 or 6/8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub fn new(numerator: u32, denominator: u32) -> Self {
        TimeSignature {
            numerator,
            denominator,
        }
    }

    /// Decode Live's single-integer time signature encoding:
    /// `(numerator - 1) + 99 * log2(denominator)`.
    pub fn from_live_enum(value: i64) -> Option<Self> {
        if value < 0 {
            return None;
        }
        let numerator = (value % 99 + 1) as u32;
        let exponent = (value / 99) as u32;
        if exponent > 5 {
            return None;
        }
        Some(TimeSignature::new(numerator, 1 << exponent))
    }

    /// True when the denominator is a power of two Live can express
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator.is_power_of_two() && self.denominator <= 32
    }

    /// Length of one beat in ticks
    pub fn beat_ticks(&self) -> i64 {
        4 * TICKS_PER_QUARTER / self.denominator as i64
    }

    /// Length of one bar in ticks
    pub fn bar_ticks(&self) -> i64 {
        self.numerator as i64 * self.beat_ticks()
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A time signature taking effect at a position (in beats)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterChange {
    pub position: f64,
    pub signature: TimeSignature,
}

/// Time signatures along the arrangement timeline.
///
/// Always holds at least one entry at position 0, sorted by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterMap {
    changes: Vec<MeterChange>,
}

impl MeterMap {
    /// A map with a single signature for the whole timeline
    pub fn constant(signature: TimeSignature) -> Self {
        MeterMap {
            changes: vec![MeterChange {
                position: 0.0,
                signature,
            }],
        }
    }

    /// Build a map from an initial signature and later changes.
    /// Changes at or before 0 replace the initial signature; duplicates at the
    /// same position keep the last one.
    pub fn with_changes(initial: TimeSignature, mut later: Vec<MeterChange>) -> Self {
        later.retain(|c| c.position.is_finite());
        later.sort_by(|a, b| a.position.total_cmp(&b.position));
        let mut changes = vec![MeterChange {
            position: 0.0,
            signature: initial,
        }];
        for change in later {
            let position = change.position.max(0.0);
            match changes.last_mut() {
                Some(last) if last.position == position => last.signature = change.signature,
                _ => changes.push(MeterChange {
                    position,
                    signature: change.signature,
                }),
            }
        }
        MeterMap { changes }
    }

    /// The signature in force at the given position
    pub fn at(&self, position: f64) -> TimeSignature {
        self.changes
            .iter()
            .take_while(|c| c.position <= position)
            .last()
            .map(|c| c.signature)
            .unwrap_or(TimeSignature::COMMON)
    }

    pub fn changes(&self) -> &[MeterChange] {
        &self.changes
    }
}

/// Musical key of the set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Key {
    /// Pitch class of the tonic, 0 = C
    pub root: u8,
    /// Scale name as stored (e.g. "Major", "Dorian")
    pub scale: String,
}

/// The arrangement loop brace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoopRegion {
    pub start: f64,
    pub end: f64,
    pub enabled: bool,
}

/// A session-view row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    /// 1-indexed position in the scene list
    pub index: usize,
    pub name: String,
}

/// An arrangement locator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: f64,
    pub name: String,
}

/// A fully decoded Live set.
///
/// Owns all of its data; nothing points back into the source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// Application that wrote the file (e.g. "Ableton Live 11.3.4")
    pub creator: Option<String>,
    pub tempo: Option<f64>,
    pub tempo_automated: bool,
    pub time_signature: Option<TimeSignature>,
    /// Meter along the timeline; 4/4 throughout when the set declares none
    pub meter: MeterMap,
    pub key: Option<Key>,
    pub loop_region: Option<LoopRegion>,
    pub tracks: Vec<Track>,
    pub master: Option<Track>,
    pub scenes: Vec<Scene>,
    pub markers: Vec<Marker>,
    /// Non-fatal problems found while extracting
    pub warnings: Vec<Warning>,
}

impl Project {
    /// Look up a track by its source identity
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == Some(id))
    }

    /// Look up a scene by its 1-indexed position
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_enum_time_signature() {
        assert_eq!(
            TimeSignature::from_live_enum(201),
            Some(TimeSignature::new(4, 4))
        );
        assert_eq!(
            TimeSignature::from_live_enum(302),
            Some(TimeSignature::new(6, 8))
        );
        assert_eq!(
            TimeSignature::from_live_enum(101),
            Some(TimeSignature::new(3, 2))
        );
        assert_eq!(TimeSignature::from_live_enum(-1), None);
    }

    #[test]
    fn test_meter_map_lookup() {
        let map = MeterMap::with_changes(
            TimeSignature::COMMON,
            vec![
                MeterChange {
                    position: 16.0,
                    signature: TimeSignature::new(3, 4),
                },
                MeterChange {
                    position: -63_072_000.0,
                    signature: TimeSignature::new(7, 8),
                },
            ],
        );
        assert_eq!(map.changes().len(), 2);
        assert_eq!(map.at(0.0), TimeSignature::new(7, 8));
        assert_eq!(map.at(15.9), TimeSignature::new(7, 8));
        assert_eq!(map.at(16.0), TimeSignature::new(3, 4));
    }

    #[test]
    fn test_bar_ticks() {
        assert_eq!(TimeSignature::COMMON.bar_ticks(), 3840);
        assert_eq!(TimeSignature::new(6, 8).bar_ticks(), 2880);
        assert_eq!(TimeSignature::new(6, 8).beat_ticks(), 480);
    }
}
