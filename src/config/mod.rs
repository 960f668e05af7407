use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    pub fn jwt_secret() -> String {
        Self::figment()
            .extract_inner("jwt_secret")
            .unwrap_or_else(|_| "default-secret".to_string())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(900)
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017/quickserve".to_string())
    }

    /// Minimum number of characters a review comment must contain.
    pub fn min_comment_length() -> usize {
        Self::figment()
            .extract_inner("min_comment_length")
            .unwrap_or(5)
    }

    /// Remote sentiment classifier endpoint. When unset, the keyword
    /// heuristic is the only scoring path.
    pub fn sentiment_api_url() -> Option<String> {
        Self::figment()
            .extract_inner("sentiment_api_url")
            .ok()
    }
}
