use serde::{Deserialize, Serialize};

/// Restaurant identifiers come from the external search provider and are opaque.
pub type RestaurantId = String;

/// A candidate restaurant, as returned by the candidate supplier and
/// snapshotted onto the lobby when matching starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    /// 1 ($) through 4 ($$$$)
    pub price_tier: u8,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    /// Free-form descriptors ("comfort", "quick", "hearty", ...) used for ranking.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Restaurant {
    pub fn price_label(&self) -> String {
        "$".repeat(self.price_tier.clamp(1, 4) as usize)
    }
}
