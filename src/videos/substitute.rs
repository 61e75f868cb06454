//! Built-in substitute video catalog
//!
//! The last fallback tier for the video path: a fixed, generated dataset
//! derived from the search query, so video requests never surface a hard
//! failure. Results are labeled `mock` on the wire so the UI can tell.

use chrono::{DateTime, Duration, Utc};

use super::CookingVideo;

const TITLE_PATTERNS: [&str; 20] = [
    "{} - Easy Recipe",
    "How to Cook {} - Tutorial",
    "Best {} Recipe - Professional",
    "Quick {} - 30 Minutes",
    "Homemade {} - Step by Step",
    "{} Masterclass - Chef Guide",
    "{} for Beginners",
    "Restaurant Style {}",
    "Healthy {} Recipe",
    "Traditional {} - Authentic",
    "{} with Fresh Ingredients",
    "Pro Tips for {}",
    "{} Cooking Challenge",
    "{} - Multiple Variations",
    "Street Food {} Recipe",
    "{} - Budget Friendly",
    "Crispy {} Recipe",
    "{} - Kitchen Hack",
    "Perfect {} Every Time",
    "{} - Secret Ingredient",
];

const CHANNELS: [&str; 10] = [
    "Food Channel",
    "Cooking Basics",
    "Chef Academy",
    "Home Chef",
    "Food Network",
    "Kitchen Chronicles",
    "Recipe Masters",
    "Culinary Arts",
    "Food Lab",
    "Pro Cooking",
];

/// Query used for the substitute featured feed
pub const FEATURED_QUERY: &str = "cooking";

/// Generate up to `count` substitute videos for a query
///
/// Deterministic for a given query and `now`: publish dates are spread
/// over the preceding 90 days by index rather than randomized, so
/// repeated fallbacks serve identical data.
pub fn substitute_videos(query: &str, count: usize, now: DateTime<Utc>) -> Vec<CookingVideo> {
    let id_stub = query.to_lowercase().replace(char::is_whitespace, "_");

    TITLE_PATTERNS
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, pattern)| {
            let published = now - Duration::days(((i * 9) % 90) as i64 + 1);
            CookingVideo {
                video_id: format!("mock_{}_{}", id_stub, i),
                title: pattern.replace("{}", query),
                thumbnail_url: format!("https://i.ytimg.com/vi/mock_{}/medium.jpg", i),
                description: format!(
                    "Learn how to make delicious {} with this comprehensive cooking guide. \
                     Perfect for home cooks and beginners.",
                    query
                ),
                channel_title: CHANNELS[i % CHANNELS.len()].to_string(),
                published_at: published.to_rfc3339(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generates_requested_count() {
        let videos = substitute_videos("pasta", 20, fixed_now());
        assert_eq!(videos.len(), 20);
    }

    #[test]
    fn test_count_capped_by_pattern_table() {
        let videos = substitute_videos("pasta", 50, fixed_now());
        assert_eq!(videos.len(), TITLE_PATTERNS.len());
    }

    #[test]
    fn test_query_is_woven_into_titles_and_ids() {
        let videos = substitute_videos("pad thai", 5, fixed_now());
        assert_eq!(videos[0].title, "pad thai - Easy Recipe");
        assert!(videos.iter().all(|v| v.video_id.starts_with("mock_pad_thai_")));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = substitute_videos("soup", 10, fixed_now());
        let b = substitute_videos("soup", 10, fixed_now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_publish_dates_are_in_the_past() {
        let now = fixed_now();
        for video in substitute_videos("soup", 20, now) {
            let published = DateTime::parse_from_rfc3339(&video.published_at).unwrap();
            assert!(published < now);
        }
    }
}
