use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{CreateRestaurantDto, Restaurant, Review, UpdateRestaurantDto};
use crate::services::rating::RecomputeOutcome;
use crate::services::RatingService;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Admin")]
#[post("/admin/restaurant/create", data = "<dto>")]
pub async fn create_restaurant(
    db: &State<DbConn>,
    _auth: AuthGuard,
    dto: Json<CreateRestaurantDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.name.trim().is_empty() {
        return Err(ApiError::bad_request("Restaurant name cannot be empty"));
    }

    let restaurant = Restaurant {
        id: None,
        name: dto.name.trim().to_string(),
        description: dto.description.clone(),
        cuisine: dto.cuisine.clone(),
        category: dto.category.clone(),
        is_veg: dto.is_veg.unwrap_or(false),
        location: dto.location.clone(),
        image_path: dto.image_path.clone(),
        budget: dto.budget,
        is_best_restaurant: false,
        rating: 0.0,
        total_reviews: 0,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Restaurant>("restaurants")
        .insert_one(&restaurant, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create restaurant: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Restaurant created successfully".to_string(),
        serde_json::json!({
            "restaurant_id": result.inserted_id.as_object_id().map(|id| id.to_hex())
        }),
    )))
}

#[openapi(tag = "Admin")]
#[put("/admin/restaurant/<restaurant_id>", data = "<dto>")]
pub async fn update_restaurant(
    db: &State<DbConn>,
    _auth: AuthGuard,
    restaurant_id: String,
    dto: Json<UpdateRestaurantDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    // The rating field is deliberately not settable here; only the
    // aggregator writes it.
    let mut updates = Document::new();
    if let Some(name) = &dto.name {
        updates.insert("name", name.trim());
    }
    if let Some(description) = &dto.description {
        updates.insert("description", description);
    }
    if let Some(cuisine) = &dto.cuisine {
        updates.insert("cuisine", cuisine);
    }
    if let Some(category) = &dto.category {
        updates.insert("category", category);
    }
    if let Some(is_veg) = dto.is_veg {
        updates.insert("is_veg", is_veg);
    }
    if let Some(location) = &dto.location {
        updates.insert("location", location);
    }
    if let Some(image_path) = &dto.image_path {
        updates.insert("image_path", image_path);
    }
    if let Some(budget) = dto.budget {
        updates.insert("budget", budget);
    }
    if let Some(is_best) = dto.is_best_restaurant {
        updates.insert("is_best_restaurant", is_best);
    }

    if updates.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    updates.insert("updated_at", Bson::DateTime(DateTime::now()));

    let result = db
        .collection::<Restaurant>("restaurants")
        .update_one(doc! { "_id": object_id }, doc! { "$set": updates }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update restaurant: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Restaurant not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Restaurant updated successfully"
    }))))
}

/// Removes the restaurant and its review history.
#[openapi(tag = "Admin")]
#[delete("/admin/restaurant/<restaurant_id>")]
pub async fn delete_restaurant(
    db: &State<DbConn>,
    _auth: AuthGuard,
    restaurant_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    let result = db
        .collection::<Restaurant>("restaurants")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete restaurant: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Restaurant not found"));
    }

    let removed_reviews = db
        .collection::<Review>("reviews")
        .delete_many(doc! { "restaurant_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete reviews: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Restaurant deleted successfully",
        "reviews_removed": removed_reviews.deleted_count,
    }))))
}

/// Manual aggregate recompute, for when a post-submission recompute failed
/// and the displayed rating lags the review set.
#[openapi(tag = "Admin")]
#[post("/admin/restaurant/<restaurant_id>/recompute-rating")]
pub async fn recompute_restaurant_rating(
    db: &State<DbConn>,
    _auth: AuthGuard,
    rating_service: &State<RatingService>,
    restaurant_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    match rating_service.recompute(db, object_id).await {
        Ok(RecomputeOutcome::Updated {
            rating,
            review_count,
        }) => Ok(Json(ApiResponse::success(serde_json::json!({
            "rating": rating,
            "review_count": review_count,
        })))),
        Ok(RecomputeOutcome::NoReviews) => Ok(Json(ApiResponse::success_with_message(
            "No reviews to aggregate; existing rating left unchanged".to_string(),
            serde_json::json!({ "updated": false }),
        ))),
        Err(e) => Err(ApiError::internal_error(format!(
            "Failed to recompute rating: {}",
            e
        ))),
    }
}
