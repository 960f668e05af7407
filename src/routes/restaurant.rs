use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::models::Restaurant;
use crate::utils::{ApiError, ApiResponse};

/// Get all restaurants
#[openapi(tag = "Restaurant")]
#[get("/restaurant/all")]
pub async fn get_all_restaurants(
    db: &State<DbConn>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut cursor = db
        .collection::<Restaurant>("restaurants")
        .find(None, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut restaurants = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let restaurant = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        restaurants.push(restaurant);
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "restaurants": restaurants,
        "total": restaurants.len()
    }))))
}

#[openapi(tag = "Restaurant")]
#[get("/restaurant/<restaurant_id>")]
pub async fn get_restaurant_by_id(
    db: &State<DbConn>,
    restaurant_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    let restaurant = db
        .collection::<Restaurant>("restaurants")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "restaurant": restaurant
    }))))
}

/// Featured restaurants, highest rated first.
#[openapi(tag = "Restaurant")]
#[get("/restaurant/best?<limit>")]
pub async fn get_best_restaurants(
    db: &State<DbConn>,
    limit: Option<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let limit = limit.unwrap_or(10).min(50);

    let find_options = FindOptions::builder()
        .limit(limit)
        .sort(doc! { "rating": -1 })
        .build();

    let mut cursor = db
        .collection::<Restaurant>("restaurants")
        .find(doc! { "is_best_restaurant": true }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut restaurants = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let restaurant = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        restaurants.push(restaurant);
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "restaurants": restaurants,
        "total": restaurants.len()
    }))))
}
