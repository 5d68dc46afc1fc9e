//! Vibe check answers and their group aggregate.
//!
//! Each of the four questions accepts a concrete answer or the `any`
//! wildcard (`flexible` is accepted as an alias on input).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealVolume {
    Snack,
    Light,
    Regular,
    Hearty,
    #[serde(alias = "flexible")]
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Cheap,
    Moderate,
    Upscale,
    Splurge,
    #[serde(alias = "flexible")]
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Comfort,
    Adventurous,
    Healthy,
    Celebratory,
    Quick,
    #[serde(alias = "flexible")]
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    Walking,
    Nearby,
    Drive,
    #[serde(alias = "flexible")]
    Any,
}

impl MealVolume {
    pub fn as_tag(&self) -> Option<&'static str> {
        match self {
            MealVolume::Snack => Some("snack"),
            MealVolume::Light => Some("light"),
            MealVolume::Regular => Some("regular"),
            MealVolume::Hearty => Some("hearty"),
            MealVolume::Any => None,
        }
    }
}

impl Budget {
    /// Highest acceptable price tier, `None` for the wildcard.
    pub fn max_price_tier(&self) -> Option<u8> {
        match self {
            Budget::Cheap => Some(1),
            Budget::Moderate => Some(2),
            Budget::Upscale => Some(3),
            Budget::Splurge => Some(4),
            Budget::Any => None,
        }
    }
}

impl Mood {
    pub fn as_tag(&self) -> Option<&'static str> {
        match self {
            Mood::Comfort => Some("comfort"),
            Mood::Adventurous => Some("adventurous"),
            Mood::Healthy => Some("healthy"),
            Mood::Celebratory => Some("celebratory"),
            Mood::Quick => Some("quick"),
            Mood::Any => None,
        }
    }
}

impl Distance {
    pub fn max_miles(&self) -> Option<f64> {
        match self {
            Distance::Walking => Some(1.0),
            Distance::Nearby => Some(5.0),
            Distance::Drive => Some(15.0),
            Distance::Any => None,
        }
    }
}

/// One participant's answers for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeCheck {
    pub meal_volume: MealVolume,
    pub budget: Budget,
    pub mood: Mood,
    pub distance: Distance,
}

/// Aggregated preferences of every participant, handed to the candidate supplier.
///
/// Budget and distance collapse to the most restrictive concrete answer.
/// Moods and meal volumes keep every concrete answer, most requested first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPreferences {
    pub participant_count: usize,
    pub max_price_tier: Option<u8>,
    pub max_distance_miles: Option<f64>,
    pub moods: Vec<Mood>,
    pub meal_volumes: Vec<MealVolume>,
}

impl GroupPreferences {
    pub fn aggregate<'a>(vibes: impl IntoIterator<Item = &'a VibeCheck>) -> Self {
        let vibes: Vec<&VibeCheck> = vibes.into_iter().collect();

        let max_price_tier = vibes.iter().filter_map(|v| v.budget.max_price_tier()).min();
        let max_distance_miles = vibes
            .iter()
            .filter_map(|v| v.distance.max_miles())
            .min_by(|a, b| a.total_cmp(b));

        let moods = by_frequency(vibes.iter().map(|v| v.mood).filter(|m| *m != Mood::Any));
        let meal_volumes = by_frequency(
            vibes
                .iter()
                .map(|v| v.meal_volume)
                .filter(|m| *m != MealVolume::Any),
        );

        Self {
            participant_count: vibes.len(),
            max_price_tier,
            max_distance_miles,
            moods,
            meal_volumes,
        }
    }

    /// Tags worth boosting when ranking candidates.
    pub fn wanted_tags(&self) -> Vec<&'static str> {
        self.moods
            .iter()
            .filter_map(Mood::as_tag)
            .chain(self.meal_volumes.iter().filter_map(MealVolume::as_tag))
            .collect()
    }
}

/// Distinct values ordered by descending count; ties keep first-seen order.
fn by_frequency<T: Copy + PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(v, _)| v).collect()
}
