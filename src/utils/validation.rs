use crate::config::Config;

/// Review comment policy: non-empty after trimming and at least the
/// configured minimum length. Rejected comments never reach the scorer.
pub fn validate_comment(comment: &str) -> Result<(), String> {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err("Comment cannot be empty".to_string());
    }
    let min_len = Config::min_comment_length();
    if trimmed.chars().count() < min_len {
        return Err(format!("Comment must be at least {} characters", min_len));
    }
    Ok(())
}

/// Star ratings come straight from the client; anything outside [1,5] is a
/// user error, not something to clamp silently.
pub fn validate_user_rating(rating: f64) -> Result<(), String> {
    if !rating.is_finite() || rating < 1.0 || rating > 5.0 {
        return Err("Rating must be between 1 and 5".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_comment_rejected() {
        assert!(validate_comment("").is_err());
        assert!(validate_comment("   ").is_err());
    }

    #[test]
    fn short_comment_rejected() {
        assert!(validate_comment("ok").is_err());
    }

    #[test]
    fn normal_comment_accepted() {
        assert!(validate_comment("The food was great").is_ok());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_user_rating(1.0).is_ok());
        assert!(validate_user_rating(5.0).is_ok());
        assert!(validate_user_rating(0.5).is_err());
        assert!(validate_user_rating(5.1).is_err());
        assert!(validate_user_rating(f64::NAN).is_err());
    }
}
