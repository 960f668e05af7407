use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Restaurant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub category: Option<String>,
    pub is_veg: bool,
    pub location: Option<String>,
    pub image_path: Option<String>,
    pub budget: Option<f64>,
    pub is_best_restaurant: bool,
    /// Aggregate over all reviews; written only by the rating service.
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRestaurantDto {
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub category: Option<String>,
    pub is_veg: Option<bool>,
    pub location: Option<String>,
    pub image_path: Option<String>,
    pub budget: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateRestaurantDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    pub is_veg: Option<bool>,
    pub location: Option<String>,
    pub image_path: Option<String>,
    pub budget: Option<f64>,
    pub is_best_restaurant: Option<bool>,
}
