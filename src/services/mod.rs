pub mod jwt;
pub mod rating;
pub mod sentiment;

pub use jwt::JwtService;
pub use rating::RatingService;
pub use sentiment::SentimentAnalyzer;
