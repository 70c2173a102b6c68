//! # Analysis Module
//!
//! The payload attached to every face analysis record.
//!
//! There is no derivation from the scanned image: every analysis carries the
//! same canned tables, in the same order. The types keep the wire shape the
//! wizard screens read (`features`, `ratings`, `recommendations`).

use serde::{Deserialize, Serialize};

/// One labelled facial feature, e.g. "Face Shape" = "Heart".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceFeature {
    pub label: String,
    pub value: String,
}

impl FaceFeature {
    /// Create a new feature entry.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A rating for one category.
///
/// Both `score` and `percentage` live in 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRating {
    pub category: String,
    pub score: u8,
    pub percentage: u8,
}

impl FaceRating {
    /// Create a new rating, clamping both values to 100.
    #[must_use]
    pub fn new(category: impl Into<String>, score: u8, percentage: u8) -> Self {
        Self {
            category: category.into(),
            score: score.min(100),
            percentage: percentage.min(100),
        }
    }

    /// Rating whose score and percentage are the same number.
    #[must_use]
    pub fn uniform(category: impl Into<String>, value: u8) -> Self {
        Self::new(category, value, value)
    }
}

/// A recommendation card.
///
/// `icon` and `color` are presentation tags (`"heart"`, `"yellow-500"`);
/// they are carried verbatim and never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRecommendation {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

impl FaceRecommendation {
    #[must_use]
    pub fn new(
        id: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

/// The complete analysis shown across the wizard screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub features: Vec<FaceFeature>,
    pub ratings: Vec<FaceRating>,
    pub recommendations: Vec<FaceRecommendation>,
}

impl AnalysisPayload {
    /// The canned analysis returned for every scan.
    #[must_use]
    pub fn canned() -> Self {
        Self {
            features: default_features(),
            ratings: default_ratings(),
            recommendations: default_recommendations(),
        }
    }

    /// True when none of the three tables has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.ratings.is_empty() && self.recommendations.is_empty()
    }

    /// Look up a rating by category name.
    #[must_use]
    pub fn rating(&self, category: &str) -> Option<&FaceRating> {
        self.ratings.iter().find(|r| r.category == category)
    }
}

// =============================================================================
// DEFAULT TABLES
// =============================================================================

fn default_features() -> Vec<FaceFeature> {
    vec![
        FaceFeature::new("Canthal Tilt", "Neutral"),
        FaceFeature::new("Eye Shape", "Almond Eyes"),
        FaceFeature::new("Eye Type", "Hunter"),
        FaceFeature::new("Face Shape", "Heart"),
        FaceFeature::new("Maxilla Development", "Neutral"),
        FaceFeature::new("Nose Shape", "Roman or Aquiline Nose"),
    ]
}

fn default_ratings() -> Vec<FaceRating> {
    vec![
        FaceRating::uniform("Overall", 80),
        FaceRating::uniform("Potential", 87),
        FaceRating::uniform("Jawline", 76),
        FaceRating::uniform("Cheekbones", 72),
        FaceRating::uniform("Skin quality", 82),
        FaceRating::uniform("Masculinity", 91),
    ]
}

fn default_recommendations() -> Vec<FaceRecommendation> {
    vec![
        FaceRecommendation::new(
            1,
            "Heart face styling",
            "Deciding the best hairstyle for you is largely based on your face shape.",
            "heart",
            "yellow-500",
        ),
        FaceRecommendation::new(
            2,
            "Start a skincare routine",
            "Skincare routines are crucial for everybody. Nobody is above it, you should start today.",
            "cloud",
            "blue-300",
        ),
        FaceRecommendation::new(
            3,
            "Strengthen your jaw",
            "Chewing and performing facial exercises will give you a much stronger jawline.",
            "bar-chart",
            "orange-300",
        ),
        FaceRecommendation::new(4, "Groom your eyebrows", "", "number", "gray-500"),
    ]
}

// =============================================================================
// TESTS
// =============================================================================
