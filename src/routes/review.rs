use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{CreateReviewDto, Restaurant, Review, User};
use crate::guards::AuthGuard;
use crate::services::rating::RecomputeOutcome;
use crate::services::sentiment::{adjust_rating, round_to_tenth};
use crate::services::{RatingService, SentimentAnalyzer};
use crate::utils::{validation, ApiError, ApiResponse};

const ANONYMOUS_USER: &str = "Anonymous";

/// Submit a review. The comment is scored for sentiment (remote classifier
/// if configured, keyword heuristic otherwise), blended with the optional
/// star rating, persisted, and the restaurant aggregate is recomputed.
///
/// The review insert is the authoritative write: once it succeeds the
/// submission has succeeded, even if the aggregate recompute then fails.
#[openapi(tag = "Review")]
#[post("/review/create", data = "<dto>")]
pub async fn create_review(
    db: &State<DbConn>,
    auth: AuthGuard,
    analyzer: &State<SentimentAnalyzer>,
    rating_service: &State<RatingService>,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    // Validation blocks before any scoring or store work
    validation::validate_comment(&dto.comment).map_err(ApiError::bad_request)?;
    if let Some(rating) = dto.rating {
        validation::validate_user_rating(rating).map_err(ApiError::bad_request)?;
    }

    let restaurant_id = ObjectId::parse_str(&dto.restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    let restaurant = db
        .collection::<Restaurant>("restaurants")
        .find_one(doc! { "_id": restaurant_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    let user_name = resolve_user_name(db, &auth.user_id).await;

    let sentiment = analyzer.analyze(&dto.comment).await;
    let adjusted_rating = dto
        .rating
        .map(|rating| round_to_tenth(adjust_rating(rating, sentiment.score)));

    let review = Review {
        id: None,
        user_id: Some(auth.user_id),
        restaurant_id,
        restaurant_name: restaurant.name.clone(),
        user_name,
        comment: dto.comment.trim().to_string(),
        user_rating: dto.rating,
        sentiment_score: sentiment.score,
        sentiment_label: sentiment.label,
        adjusted_rating,
        created_at: DateTime::now(),
    };

    let result = db
        .collection::<Review>("reviews")
        .insert_one(&review, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save review: {}", e)))?;

    // Best-effort from here on: the review is durable, the aggregate is a
    // derived cache that can be recomputed on the next write.
    let new_rating = match rating_service.recompute(db, restaurant_id).await {
        Ok(RecomputeOutcome::Updated { rating, .. }) => Some(rating),
        Ok(RecomputeOutcome::NoReviews) => None,
        Err(e) => {
            warn!(
                "Aggregate recompute failed for restaurant {} after review save: {}",
                restaurant_id.to_hex(),
                e
            );
            None
        }
    };

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        serde_json::json!({
            "review_id": result.inserted_id.as_object_id().map(|id| id.to_hex()),
            "sentiment_score": sentiment.score,
            "sentiment_label": sentiment.label,
            "adjusted_rating": adjusted_rating,
            "restaurant_rating": new_rating,
        }),
    )))
}

/// Display-name denormalization. Lookup problems degrade to the anonymous
/// placeholder; they never block a submission.
async fn resolve_user_name(db: &DbConn, user_id: &ObjectId) -> String {
    match db
        .collection::<User>("users")
        .find_one(doc! { "_id": user_id }, None)
        .await
    {
        Ok(Some(user)) => user
            .name
            .or(user.email)
            .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        Ok(None) => ANONYMOUS_USER.to_string(),
        Err(e) => {
            warn!("User lookup failed, submitting anonymously: {}", e);
            ANONYMOUS_USER.to_string()
        }
    }
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct RestaurantReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Review")]
#[get("/review/restaurant/<restaurant_id>?<query..>")]
pub async fn get_restaurant_reviews(
    db: &State<DbConn>,
    restaurant_id: String,
    query: RestaurantReviewsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    let filter = doc! { "restaurant_id": object_id };

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut reviews = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let review = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        reviews.push(review);
    }

    let total = db
        .collection::<Review>("reviews")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": reviews,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

/// Review count, average rating and sentiment breakdown, derived from the
/// same per-review values the aggregator folds into the displayed rating.
#[openapi(tag = "Review")]
#[get("/review/restaurant/<restaurant_id>/stats")]
pub async fn get_restaurant_rating_stats(
    db: &State<DbConn>,
    rating_service: &State<RatingService>,
    restaurant_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&restaurant_id)
        .map_err(|_| ApiError::bad_request("Invalid restaurant ID"))?;

    let stats = rating_service
        .stats(db, object_id)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to compute stats: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "restaurant_id": restaurant_id,
        "stats": stats,
    }))))
}
