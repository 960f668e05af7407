use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Discrete sentiment class, always derived from the score via the fixed
/// thresholds in `services::sentiment` — never set independently.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// One user's feedback on one restaurant. Reviews are write-once: created on
/// submission and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Absent for anonymous submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    pub restaurant_id: ObjectId,
    /// Denormalized at submission time for display.
    pub restaurant_name: String,
    pub user_name: String,
    pub comment: String,
    /// Explicit star rating in [1,5]; only some client flows collect one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f64>,
    /// In [0,1]; 0 most negative, 1 most positive. Computed, never supplied.
    pub sentiment_score: f32,
    pub sentiment_label: SentimentLabel,
    /// In [1,5]; present only when `user_rating` was collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_rating: Option<f64>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewDto {
    pub restaurant_id: String,
    pub comment: String,
    /// Optional star rating in [1,5].
    pub rating: Option<f64>,
}
