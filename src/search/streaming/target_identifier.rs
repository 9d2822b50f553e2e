//! Target identification strategies for streaming search.
//!
//! The target identifier determines if search results have a clear "winner" -
//! the single item the user most likely wanted. This enables rich enrichment
//! (popular tracks, albums, related artists) for high-confidence matches.

use tracing::debug;

use crate::search::{HashedItemType, SearchResult};

use super::MatchType;

/// Result of target identification with the matched item and confidence score.
#[derive(Debug, Clone)]
pub struct IdentifiedTarget {
    /// The search result identified as the target
    pub result: SearchResult,
    /// Confidence score (0.0 - 1.0) for this identification
    pub confidence: f64,
    /// The type of match for the target
    pub match_type: MatchType,
}

/// Targets identified per content type.
#[derive(Debug, Clone, Default)]
pub struct PerTypeTargets {
    pub artist: Option<IdentifiedTarget>,
    pub album: Option<IdentifiedTarget>,
    pub track: Option<IdentifiedTarget>,
}

/// Trait for target identification strategies.
///
/// Implementations decide if search results have a clear "winner" that should
/// receive special treatment (enrichment with popular content, related artists, etc.).
///
/// Strategies are swappable to allow easy tuning of the identification logic.
pub trait TargetIdentifier: Send + Sync {
    /// Given a query and ranked search results, identify if there's a clear target.
    ///
    /// Returns `Some(IdentifiedTarget)` if there's a high-confidence match,
    /// or `None` if no clear winner was found.
    fn identify_target(&self, query: &str, results: &[SearchResult]) -> Option<IdentifiedTarget>;

    /// Identify the best target for each content type separately.
    ///
    /// Splits results by type and finds the best match within each category.
    fn identify_targets_by_type(&self, query: &str, results: &[SearchResult]) -> PerTypeTargets;
}

/// Configuration for the ScoreGapStrategy.
#[derive(Debug, Clone)]
pub struct ScoreGapConfig {
    /// Minimum normalized score for top result (0.0 - 1.0).
    /// Results below this threshold won't be considered as targets.
    pub min_absolute_score: f64,

    /// Minimum gap between #1 and #2 as ratio of #1's score.
    /// e.g., 0.15 means #1 must be at least 15% better than #2.
    pub min_score_gap_ratio: f64,

    /// Additional confidence boost for exact name matches.
    pub exact_match_boost: f64,

    /// Maximum raw score value for normalization.
    /// Lower raw scores are better (hamming distance), so this is used to invert.
    pub max_raw_score: u32,
}

impl Default for ScoreGapConfig {
    fn default() -> Self {
        Self {
            min_absolute_score: 0.3,
            min_score_gap_ratio: 0.10,
            exact_match_boost: 0.2,
            // Note: This needs to accommodate different search engines.
            // SimHash uses 0-128, but FTS5 BM25 scores can be in thousands.
            // Using a large value that works for both.
            max_raw_score: 10000,
        }
    }
}

/// Default target identification strategy.
///
/// Combines absolute score threshold with relative score gap between
/// the top two results. Also provides a confidence boost for exact matches.
pub struct ScoreGapStrategy {
    config: ScoreGapConfig,
}

impl ScoreGapStrategy {
    pub fn new(config: ScoreGapConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw score to 0.0-1.0 range.
    /// For FTS5 BM25: scores are (-bm25 * 1000), so higher raw score = better match.
    /// We normalize to higher = better (1.0 = best match).
    fn normalize_score(&self, raw_score: u32) -> f64 {
        let clamped = raw_score.min(self.config.max_raw_score);
        clamped as f64 / self.config.max_raw_score as f64
    }

    /// Check if the query is an exact match for the result's matchable text.
    fn is_exact_match(&self, query: &str, result: &SearchResult) -> bool {
        let query_normalized = query.to_lowercase().trim().to_string();
        let result_normalized = result.matchable_text.to_lowercase().trim().to_string();
        query_normalized == result_normalized
    }
}

impl Default for ScoreGapStrategy {
    fn default() -> Self {
        Self::new(ScoreGapConfig::default())
    }
}

impl TargetIdentifier for ScoreGapStrategy {
    fn identify_target(&self, query: &str, results: &[SearchResult]) -> Option<IdentifiedTarget> {
        let first = results.first()?;

        // Normalize the score
        let first_score = self.normalize_score(first.score);

        debug!(
            query = %query,
            first_raw_score = first.score,
            first_normalized = first_score,
            first_text = %first.matchable_text,
            min_absolute = self.config.min_absolute_score,
            "Target identification: checking first result"
        );

        // Check absolute threshold
        if first_score < self.config.min_absolute_score {
            debug!(
                first_score = first_score,
                threshold = self.config.min_absolute_score,
                "Target rejected: below absolute score threshold"
            );
            return None;
        }

        // Check gap to second result (if exists)
        if let Some(second) = results.get(1) {
            let second_score = self.normalize_score(second.score);
            let gap = first_score - second_score;
            let gap_ratio = gap / first_score;

            debug!(
                second_raw_score = second.score,
                second_normalized = second_score,
                second_text = %second.matchable_text,
                gap = gap,
                gap_ratio = gap_ratio,
                min_gap_ratio = self.config.min_score_gap_ratio,
                "Target identification: checking gap to second result"
            );

            // Gap must be at least min_score_gap_ratio of the first score
            if gap_ratio < self.config.min_score_gap_ratio {
                debug!(
                    gap_ratio = gap_ratio,
                    required = self.config.min_score_gap_ratio,
                    "Target rejected: insufficient gap between first and second result"
                );
                return None;
            }
        }
        // If only one result, it's automatically a clear winner

        // Calculate confidence with optional exact match boost
        let is_exact = self.is_exact_match(query, first);
        let confidence = if is_exact {
            (first_score + self.config.exact_match_boost).min(1.0)
        } else {
            first_score
        };

        // Convert HashedItemType to MatchType
        let match_type = match first.item_type {
            HashedItemType::Artist => MatchType::Artist,
            HashedItemType::Album => MatchType::Album,
            HashedItemType::Track => MatchType::Track,
        };

        debug!(
            target_id = %first.item_id,
            target_text = %first.matchable_text,
            confidence = confidence,
            is_exact = is_exact,
            match_type = ?match_type,
            "Target identified successfully"
        );

        Some(IdentifiedTarget {
            result: first.clone(),
            confidence,
            match_type,
        })
    }

    fn identify_targets_by_type(&self, query: &str, results: &[SearchResult]) -> PerTypeTargets {
        // Split results by type
        let artists: Vec<_> = results
            .iter()
            .filter(|r| r.item_type == HashedItemType::Artist)
            .cloned()
            .collect();
        let albums: Vec<_> = results
            .iter()
            .filter(|r| r.item_type == HashedItemType::Album)
            .cloned()
            .collect();
        let tracks: Vec<_> = results
            .iter()
            .filter(|r| r.item_type == HashedItemType::Track)
            .cloned()
            .collect();

        debug!(
            query = %query,
            artist_count = artists.len(),
            album_count = albums.len(),
            track_count = tracks.len(),
            "Identifying targets by type"
        );

        // Find best target in each category
        PerTypeTargets {
            artist: self.identify_target(query, &artists),
            album: self.identify_target(query, &albums),
            track: self.identify_target(query, &tracks),
        }
    }
}
