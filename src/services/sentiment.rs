use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::models::SentimentLabel;

/// Fixed classification thresholds, symmetric around 0.5.
pub const POSITIVE_THRESHOLD: f32 = 0.6;
pub const NEGATIVE_THRESHOLD: f32 = 0.4;

/// Tokens after a negation word that have their polarity flipped.
const NEGATION_WINDOW: usize = 3;

/// Asymptotic cap on how far evidence can push a score from neutral. Keeps
/// the output strictly inside (0,1) no matter how many keywords match.
const MAX_INTENSITY: f32 = 0.9;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "good", "great", "excellent", "amazing", "awesome", "delicious",
        "tasty", "fresh", "love", "loved", "best", "perfect", "wonderful",
        "nice", "friendly", "fast", "clean", "affordable", "authentic",
        "crispy", "flavorful", "generous", "recommend", "recommended",
        "yummy", "polite", "quick", "warm", "cozy", "attentive",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "terrible", "horrible", "awful", "disgusting", "worst",
        "hate", "hated", "poor", "slow", "dirty", "rude", "overpriced",
        "bland", "stale", "cold", "soggy", "greasy", "tasteless",
        "undercooked", "overcooked", "expensive", "mediocre", "smelly",
        "noisy", "crowded", "disappointing", "inedible", "burnt",
    ]
    .into_iter()
    .collect()
});

static NEGATION_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "not", "no", "never", "didnt", "dont", "doesnt", "wasnt", "werent",
        "isnt", "arent", "wont", "cant", "couldnt", "wouldnt", "shouldnt",
        "hardly", "barely",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentResult {
    /// In [0,1]; 0 most negative, 1 most positive.
    pub score: f32,
    pub label: SentimentLabel,
}

impl SentimentResult {
    fn neutral() -> Self {
        SentimentResult {
            score: 0.5,
            label: SentimentLabel::Neutral,
        }
    }
}

/// Label for a score under the fixed thresholds.
pub fn classify(score: f32) -> SentimentLabel {
    if score >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if score <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Keyword-frequency heuristic with a bounded negation window. Pure and
/// total: any string, including empty, produces a valid result.
pub fn score_keywords(comment: &str) -> SentimentResult {
    if comment.trim().is_empty() {
        return SentimentResult::neutral();
    }

    let lowered = comment.to_lowercase();
    let mut positive = 0u32;
    let mut negative = 0u32;
    let mut negated_for = 0usize;

    for raw in lowered.split_whitespace() {
        let token: String = raw.chars().filter(|c| c.is_alphabetic()).collect();
        if token.is_empty() {
            continue;
        }

        if NEGATION_WORDS.contains(token.as_str()) {
            negated_for = NEGATION_WINDOW;
            continue;
        }

        let flipped = negated_for > 0;
        if POSITIVE_WORDS.contains(token.as_str()) {
            if flipped {
                negative += 1;
            } else {
                positive += 1;
            }
        } else if NEGATIVE_WORDS.contains(token.as_str()) {
            if flipped {
                positive += 1;
            } else {
                negative += 1;
            }
        }

        negated_for = negated_for.saturating_sub(1);
    }

    let total = positive + negative;
    if total == 0 {
        return SentimentResult::neutral();
    }

    let base = positive as f32 / total as f32;
    let intensity = MAX_INTENSITY * total as f32 / (total as f32 + 1.0);
    let score = 0.5 + (base - 0.5) * intensity;

    SentimentResult {
        score,
        label: classify(score),
    }
}

/// Blend an explicit star rating with the text sentiment. The star rating is
/// the primary signal; sentiment nudges it by at most ±0.25 stars.
pub fn adjust_rating(user_rating: f64, sentiment_score: f32) -> f64 {
    let adjusted = user_rating + (sentiment_score as f64 - 0.5) * 0.5;
    adjusted.clamp(1.0, 5.0)
}

/// Display/persistence rounding for ratings.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Deserialize)]
struct RemoteScore {
    score: f32,
}

/// Sentiment analyzer with an optional remote classifier in front of the
/// keyword heuristic. Remote failures of any kind degrade to the heuristic;
/// callers never see a classifier error.
pub struct SentimentAnalyzer {
    remote_url: Option<String>,
    client: reqwest::Client,
}

impl SentimentAnalyzer {
    pub fn new(remote_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        if let Some(url) = &remote_url {
            info!("Sentiment classifier endpoint configured: {}", url);
        } else {
            info!("No sentiment classifier endpoint, using keyword heuristic only");
        }

        SentimentAnalyzer { remote_url, client }
    }

    pub fn from_config() -> Self {
        Self::new(crate::config::Config::sentiment_api_url())
    }

    pub async fn analyze(&self, comment: &str) -> SentimentResult {
        if comment.trim().is_empty() {
            return SentimentResult::neutral();
        }

        if let Some(url) = &self.remote_url {
            match self.classify_remote(url, comment).await {
                Ok(score) if (0.0..=1.0).contains(&score) => {
                    return SentimentResult {
                        score,
                        label: classify(score),
                    };
                }
                Ok(score) => {
                    warn!("Classifier returned out-of-range score {}, falling back", score);
                }
                Err(e) => {
                    warn!("Classifier unavailable ({}), falling back to keywords", e);
                }
            }
        }

        score_keywords(comment)
    }

    async fn classify_remote(&self, url: &str, comment: &str) -> Result<f32, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": comment }))
            .send()
            .await?
            .error_for_status()?
            .json::<RemoteScore>()
            .await?;
        Ok(response.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_are_neutral() {
        assert_eq!(score_keywords(""), SentimentResult::neutral());
        assert_eq!(score_keywords("   \t\n"), SentimentResult::neutral());
    }

    #[test]
    fn no_signal_is_neutral() {
        let result = score_keywords("I ordered the lunch special on Tuesday");
        assert_eq!(result.score, 0.5);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn non_latin_text_is_neutral() {
        let result = score_keywords("料理はとても美味しかったです 🍜");
        assert_eq!(result.score, 0.5);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn score_stays_in_range() {
        let comments = [
            "delicious delicious delicious amazing perfect best",
            "awful awful disgusting worst terrible horrible rude dirty",
            "good bad good bad",
            "not good",
            "the delivery guy was ok",
        ];
        for comment in comments {
            let result = score_keywords(comment);
            assert!(
                (0.0..=1.0).contains(&result.score),
                "score out of range for {:?}: {}",
                comment,
                result.score
            );
            assert_eq!(result.label, classify(result.score));
        }
    }

    #[test]
    fn classification_thresholds_are_exact() {
        assert_eq!(classify(0.6), SentimentLabel::Positive);
        assert_eq!(classify(0.59), SentimentLabel::Neutral);
        assert_eq!(classify(0.5), SentimentLabel::Neutral);
        assert_eq!(classify(0.41), SentimentLabel::Neutral);
        assert_eq!(classify(0.4), SentimentLabel::Negative);
    }

    #[test]
    fn tie_is_exactly_neutral() {
        let result = score_keywords("good food but rude staff");
        assert_eq!(result.score, 0.5);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn negation_flips_polarity() {
        let negated = score_keywords("not good");
        let plain_negative = score_keywords("bad");
        assert_eq!(negated.label, SentimentLabel::Negative);
        assert!(negated.score <= plain_negative.score);
    }

    #[test]
    fn negation_window_is_bounded() {
        // Four tokens between "not" and "delicious": outside the window,
        // so the positive word keeps its polarity.
        let result = score_keywords("not that it matters much but delicious food");
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn more_evidence_is_more_confident() {
        let one = score_keywords("delicious");
        let three = score_keywords("delicious tasty amazing");
        assert!(three.score > one.score);
        assert!(three.score < 0.95);
    }

    #[test]
    fn scores_never_saturate() {
        let many = "delicious ".repeat(50);
        let result = score_keywords(&many);
        assert!(result.score < 1.0);
        let many_bad = "awful ".repeat(50);
        let result = score_keywords(&many_bad);
        assert!(result.score > 0.0);
    }

    #[test]
    fn sample_review_scores_positive() {
        let result =
            score_keywords("The food was absolutely delicious and the staff were friendly");
        assert!(result.score >= 0.6);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn full_pipeline_on_sample_review() {
        let comment = "The food was absolutely delicious and the staff were friendly";
        let result = score_keywords(comment);
        assert_eq!(result.label, SentimentLabel::Positive);

        let adjusted = round_to_tenth(adjust_rating(4.0, result.score));
        assert!((4.0..=4.3).contains(&adjusted), "adjusted = {}", adjusted);
    }

    #[test]
    fn adjust_neutral_sentiment_is_identity() {
        assert_eq!(adjust_rating(3.0, 0.5), 3.0);
    }

    #[test]
    fn adjust_nudges_at_most_a_quarter_star() {
        assert_eq!(adjust_rating(3.0, 1.0), 3.25);
        assert_eq!(adjust_rating(3.0, 0.0), 2.75);
    }

    #[test]
    fn adjust_stays_in_bounds() {
        for rating in [1.0, 2.0, 3.0, 4.0, 5.0] {
            for score in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
                let adjusted = adjust_rating(rating, score);
                assert!((1.0..=5.0).contains(&adjusted));
            }
        }
        assert_eq!(adjust_rating(5.0, 1.0), 5.0);
        assert_eq!(adjust_rating(1.0, 0.0), 1.0);
    }

    #[test]
    fn rounding_to_one_decimal() {
        assert_eq!(round_to_tenth(4.15), 4.2);
        assert_eq!(round_to_tenth(3.9999), 4.0);
        assert_eq!(round_to_tenth(2.04), 2.0);
    }

    #[tokio::test]
    async fn analyzer_without_remote_uses_keywords() {
        let analyzer = SentimentAnalyzer::new(None);
        let result = analyzer.analyze("the service was terrible and slow").await;
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn unreachable_remote_degrades_to_keywords() {
        // Nothing listens on this port; the request fails and the keyword
        // path must take over without surfacing an error.
        let analyzer = SentimentAnalyzer::new(Some("http://127.0.0.1:9/score".to_string()));
        let result = analyzer.analyze("delicious food, friendly staff").await;
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[tokio::test]
    async fn analyzer_short_circuits_empty_input() {
        let analyzer = SentimentAnalyzer::new(Some("http://127.0.0.1:9/score".to_string()));
        let result = analyzer.analyze("").await;
        assert_eq!(result, SentimentResult::neutral());
    }
}
