use mongodb::bson::{doc, oid::ObjectId, DateTime};
use rocket::futures::TryStreamExt;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use crate::db::DbConn;
use crate::models::{Restaurant, Review, SentimentLabel};
use crate::services::sentiment::round_to_tenth;

/// Per-operation timeout for store round-trips. A stalled call is the only
/// operational failure mode that matters here.
const OP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("database error: {0}")]
    Db(#[from] mongodb::error::Error),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

/// Outcome of a recompute. Zero matching reviews is a distinct non-error
/// signal: the prior stored rating is left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecomputeOutcome {
    Updated { rating: f64, review_count: usize },
    NoReviews,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
pub struct RatingStats {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
}

/// Sentiment-only fallback for reviews that never collected a star rating:
/// linear map from [0,1] onto [1,5].
pub fn rating_from_sentiment(sentiment_score: f32) -> f64 {
    (1.0 + sentiment_score as f64 * 4.0).clamp(1.0, 5.0)
}

/// The per-review value folded into the aggregate. The stored adjusted
/// rating wins when present; older text-only reviews fall back to their
/// sentiment score.
pub fn review_rating_value(review: &Review) -> f64 {
    review
        .adjusted_rating
        .unwrap_or_else(|| rating_from_sentiment(review.sentiment_score))
}

/// Mean over the full review set, rounded to 1 decimal. `None` when there is
/// nothing to aggregate.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: f64 = reviews.iter().map(review_rating_value).sum();
    Some(round_to_tenth(total / reviews.len() as f64))
}

pub fn compute_stats(reviews: &[Review]) -> RatingStats {
    let mut stats = RatingStats {
        total_reviews: reviews.len(),
        average_rating: average_rating(reviews).unwrap_or(0.0),
        ..RatingStats::default()
    };
    for review in reviews {
        match review.sentiment_label {
            SentimentLabel::Positive => stats.positive_count += 1,
            SentimentLabel::Neutral => stats.neutral_count += 1,
            SentimentLabel::Negative => stats.negative_count += 1,
        }
    }
    stats
}

/// Recomputes restaurant aggregates from the full review history. The full
/// recompute (rather than a stored running mean) keeps the aggregate honest
/// across reviews that were written with and without star ratings.
pub struct RatingService {
    // One async mutex per restaurant so concurrent submissions cannot
    // interleave fetch-then-write and lose an update.
    locks: Mutex<HashMap<ObjectId, Arc<Mutex<()>>>>,
}

impl RatingService {
    pub fn new() -> Self {
        RatingService {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, restaurant_id: &ObjectId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(*restaurant_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Re-derive the restaurant's displayed rating from every review on
    /// record for it, and write it back. Invoked after each successful
    /// review insert and from the admin recompute endpoint.
    pub async fn recompute(
        &self,
        db: &DbConn,
        restaurant_id: ObjectId,
    ) -> Result<RecomputeOutcome, RatingError> {
        let lock = self.lock_for(&restaurant_id).await;
        let _guard = lock.lock().await;

        let reviews = self.fetch_reviews(db, restaurant_id).await?;

        let Some(rating) = average_rating(&reviews) else {
            warn!("No reviews found for restaurant {}", restaurant_id.to_hex());
            return Ok(RecomputeOutcome::NoReviews);
        };

        let restaurants = db.collection::<Restaurant>("restaurants");
        let review_count = reviews.len();
        with_retry("restaurant rating write", || {
            let restaurants = restaurants.clone();
            async move {
                restaurants
                    .update_one(
                        doc! { "_id": restaurant_id },
                        doc! { "$set": {
                            "rating": rating,
                            "total_reviews": review_count as i32,
                            "updated_at": DateTime::now(),
                        }},
                        None,
                    )
                    .await
            }
        })
        .await?;

        info!(
            "Restaurant {} rating recomputed to {} from {} reviews",
            restaurant_id.to_hex(),
            rating,
            review_count
        );

        Ok(RecomputeOutcome::Updated {
            rating,
            review_count,
        })
    }

    /// Review-count and sentiment breakdown for a restaurant, derived the
    /// same way as the aggregate itself.
    pub async fn stats(
        &self,
        db: &DbConn,
        restaurant_id: ObjectId,
    ) -> Result<RatingStats, RatingError> {
        let reviews = self.fetch_reviews(db, restaurant_id).await?;
        Ok(compute_stats(&reviews))
    }

    async fn fetch_reviews(
        &self,
        db: &DbConn,
        restaurant_id: ObjectId,
    ) -> Result<Vec<Review>, RatingError> {
        let reviews = db.collection::<Review>("reviews");
        with_retry("review fetch", || {
            let reviews = reviews.clone();
            async move {
                reviews
                    .find(doc! { "restaurant_id": restaurant_id }, None)
                    .await?
                    .try_collect()
                    .await
            }
        })
        .await
    }
}

impl Default for RatingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded timeout plus jittered exponential backoff around one store
/// round-trip.
async fn with_retry<T, F, Fut>(op_name: &'static str, mut op: F) -> Result<T, RatingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, mongodb::error::Error>>,
{
    use rand::Rng;

    let mut delay = BASE_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match timeout(OP_TIMEOUT, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(RatingError::Db(e));
                }
                warn!("{} failed (attempt {}): {}", op_name, attempt, e);
            }
            Err(_) => {
                if attempt >= MAX_ATTEMPTS {
                    return Err(RatingError::Timeout(op_name));
                }
                warn!("{} timed out (attempt {})", op_name, attempt);
            }
        }

        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
        sleep(delay + jitter).await;
        delay *= 2;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(adjusted: Option<f64>, sentiment: f32, label: SentimentLabel) -> Review {
        Review {
            id: Some(ObjectId::new()),
            user_id: None,
            restaurant_id: ObjectId::new(),
            restaurant_name: "Test Kitchen".to_string(),
            user_name: "Anonymous".to_string(),
            comment: "placeholder".to_string(),
            user_rating: adjusted.map(|_| 4.0),
            sentiment_score: sentiment,
            sentiment_label: label,
            adjusted_rating: adjusted,
            created_at: DateTime::now(),
        }
    }

    #[test]
    fn sentiment_to_rating_map() {
        assert_eq!(rating_from_sentiment(0.0), 1.0);
        assert_eq!(rating_from_sentiment(0.5), 3.0);
        assert_eq!(rating_from_sentiment(1.0), 5.0);
    }

    #[test]
    fn adjusted_rating_takes_precedence() {
        let r = review(Some(2.5), 1.0, SentimentLabel::Positive);
        assert_eq!(review_rating_value(&r), 2.5);
    }

    #[test]
    fn sentiment_fallback_when_no_star_rating() {
        let r = review(None, 0.75, SentimentLabel::Positive);
        assert_eq!(review_rating_value(&r), 4.0);
    }

    #[test]
    fn mean_over_adjusted_ratings() {
        let reviews = vec![
            review(Some(4.0), 0.8, SentimentLabel::Positive),
            review(Some(5.0), 0.9, SentimentLabel::Positive),
            review(Some(3.0), 0.5, SentimentLabel::Neutral),
        ];
        assert_eq!(average_rating(&reviews), Some(4.0));
    }

    #[test]
    fn recompute_is_idempotent_on_unchanged_set() {
        let reviews = vec![
            review(Some(4.3), 0.8, SentimentLabel::Positive),
            review(None, 0.35, SentimentLabel::Negative),
            review(Some(2.1), 0.2, SentimentLabel::Negative),
        ];
        let first = average_rating(&reviews);
        let second = average_rating(&reviews);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_review_set_yields_nothing() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        let reviews = vec![
            review(Some(4.0), 0.8, SentimentLabel::Positive),
            review(Some(4.5), 0.9, SentimentLabel::Positive),
            review(Some(4.0), 0.7, SentimentLabel::Positive),
        ];
        // 12.5 / 3 = 4.1666...
        assert_eq!(average_rating(&reviews), Some(4.2));
    }

    #[test]
    fn stats_count_by_label() {
        let reviews = vec![
            review(Some(5.0), 0.9, SentimentLabel::Positive),
            review(Some(4.0), 0.7, SentimentLabel::Positive),
            review(None, 0.5, SentimentLabel::Neutral),
            review(None, 0.2, SentimentLabel::Negative),
        ];
        let stats = compute_stats(&reviews);
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.positive_count, 2);
        assert_eq!(stats.neutral_count, 1);
        assert_eq!(stats.negative_count, 1);
        assert!(stats.average_rating > 0.0);
    }

    #[test]
    fn empty_stats_are_zeroed() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_rating, 0.0);
    }

    #[tokio::test]
    async fn same_restaurant_shares_a_lock() {
        let service = RatingService::new();
        let id = ObjectId::new();
        let a = service.lock_for(&id).await;
        let b = service.lock_for(&id).await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = service.lock_for(&ObjectId::new()).await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let mut calls = 0u32;
        let result: Result<(), _> = with_retry("always failing op", || {
            calls += 1;
            async {
                Err(mongodb::error::Error::custom(
                    "synthetic failure".to_string(),
                ))
            }
        })
        .await;
        assert!(matches!(result, Err(RatingError::Db(_))));
        assert_eq!(calls, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn retry_returns_first_success() {
        let mut calls = 0u32;
        let result = with_retry("flaky op", || {
            calls += 1;
            let ok = calls >= 2;
            async move {
                if ok {
                    Ok(42)
                } else {
                    Err(mongodb::error::Error::custom("transient".to_string()))
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 2);
    }
}
