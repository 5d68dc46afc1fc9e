//! Candidate suppliers.
//!
//! `HttpCandidateSupplier` delegates to the external search/ranking service.
//! `CatalogCandidateSupplier` ranks a local JSON catalog and is used when no
//! service is configured (local development, demos).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::BaseCandidateSupplier;
use crate::domains::lobby::models::{GroupPreferences, Restaurant};

// =============================================================================
// HTTP recommendation service
// =============================================================================

pub struct HttpCandidateSupplier {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateRequest<'a> {
    preferences: &'a GroupPreferences,
    limit: usize,
}

impl HttpCandidateSupplier {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl BaseCandidateSupplier for HttpCandidateSupplier {
    async fn candidates(&self, preferences: &GroupPreferences, limit: usize) -> Result<Vec<Restaurant>> {
        debug!(endpoint = %self.endpoint, limit, "Requesting restaurant candidates");

        let restaurants: Vec<Restaurant> = self
            .client
            .post(&self.endpoint)
            .json(&CandidateRequest { preferences, limit })
            .send()
            .await
            .context("Candidate service request failed")?
            .error_for_status()
            .context("Candidate service returned an error status")?
            .json()
            .await
            .context("Candidate service returned malformed restaurants")?;

        info!(count = restaurants.len(), "Received restaurant candidates");
        Ok(restaurants)
    }
}

// =============================================================================
// Local catalog
// =============================================================================

pub struct CatalogCandidateSupplier {
    restaurants: Vec<Restaurant>,
}

impl CatalogCandidateSupplier {
    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        Self { restaurants }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read restaurant catalog {}", path.display()))?;
        let restaurants: Vec<Restaurant> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid restaurant catalog {}", path.display()))?;

        info!(count = restaurants.len(), path = %path.display(), "Loaded restaurant catalog");
        Ok(Self::new(restaurants))
    }

    /// Filter to what the whole group accepts, then rank by tag overlap and rating.
    pub fn rank(&self, preferences: &GroupPreferences, limit: usize) -> Vec<Restaurant> {
        let wanted = preferences.wanted_tags();

        let mut scored: Vec<(usize, &Restaurant)> = self
            .restaurants
            .iter()
            .filter(|r| preferences.max_price_tier.map_or(true, |max| r.price_tier <= max))
            .filter(|r| match (preferences.max_distance_miles, r.distance_miles) {
                (Some(max), Some(distance)) => distance <= max,
                _ => true,
            })
            .map(|r| {
                let overlap = r
                    .tags
                    .iter()
                    .filter(|tag| wanted.iter().any(|w| tag.eq_ignore_ascii_case(w)))
                    .count();
                (overlap, r)
            })
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .cmp(a_score)
                .then_with(|| b.rating.total_cmp(&a.rating))
        });

        scored.into_iter().take(limit).map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl BaseCandidateSupplier for CatalogCandidateSupplier {
    async fn candidates(&self, preferences: &GroupPreferences, limit: usize) -> Result<Vec<Restaurant>> {
        Ok(self.rank(preferences, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::lobby::models::{Budget, Distance, MealVolume, Mood, VibeCheck};

    fn restaurant(id: &str, price_tier: u8, rating: f32, distance: f64, tags: &[&str]) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: id.to_string(),
            cuisine: "mixed".to_string(),
            price_tier,
            rating,
            description: String::new(),
            dietary_tags: Vec::new(),
            image_url: None,
            distance_miles: Some(distance),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn catalog() -> CatalogCandidateSupplier {
        CatalogCandidateSupplier::new(vec![
            restaurant("diner", 1, 4.0, 0.5, &["comfort", "hearty"]),
            restaurant("bistro", 3, 4.8, 0.8, &["celebratory"]),
            restaurant("salad", 2, 4.5, 0.9, &["healthy", "light"]),
            restaurant("far-bbq", 2, 4.9, 12.0, &["comfort", "hearty"]),
            restaurant("noodles", 2, 4.1, 0.3, &["Comfort", "quick"]),
        ])
    }

    fn prefs(budget: Budget, distance: Distance, mood: Mood) -> GroupPreferences {
        GroupPreferences::aggregate(&[VibeCheck {
            meal_volume: MealVolume::Any,
            budget,
            mood,
            distance,
        }])
    }

    #[test]
    fn test_rank_filters_price_and_distance() {
        let ranked = catalog().rank(&prefs(Budget::Moderate, Distance::Walking, Mood::Any), 10);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["salad", "noodles", "diner"]);
    }

    #[test]
    fn test_rank_prefers_tag_overlap_over_rating() {
        let ranked = catalog().rank(&prefs(Budget::Any, Distance::Walking, Mood::Comfort), 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["noodles", "diner"]);
    }

    #[tokio::test]
    async fn test_catalog_supplier_respects_limit() {
        let supplier = catalog();
        let result = supplier
            .candidates(&prefs(Budget::Any, Distance::Any, Mood::Any), 1)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "far-bbq");
    }
}
