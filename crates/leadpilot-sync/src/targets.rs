//! Scrape target normalization, identity and merging.
//!
//! # Design
//! - Raw form input is text; normalization turns it into typed targets or
//!   rejects it. Nothing rejected here ever reaches the network.
//! - Identity fields are trimmed, stripped of unsupported characters and
//!   truncated before the emptiness check.
//! - Deduplication uses a case-insensitive identity key that is never sent.
//! - Merging replaces matches in place (last write wins) and appends new keys.

use leadpilot_api_models::{GoogleMapsTarget, InstagramTarget, ScrapeTarget, TargetKind};
use leadpilot_config::TargetConfig;
use regex::Regex;

use crate::error::QueueError;

const SANITIZE_PATTERN: &str = r#"[^\w\s\-\.,'"()]"#;
const MAX_PLACE_CHARS: usize = 100;
const MAX_KEYWORD_CHARS: usize = 200;

/// Unvalidated target exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTarget {
    /// Google Maps form or paste line.
    GoogleMaps {
        /// City text.
        city: String,
        /// Category text.
        category: String,
        /// Limit text, if provided.
        limit: Option<String>,
    },
    /// Instagram form or paste line.
    Instagram {
        /// Keyword text.
        keyword: String,
        /// Limit text, if provided.
        limit: Option<String>,
        /// Lower follower bound text.
        followers_min: Option<String>,
        /// Upper follower bound text.
        followers_max: Option<String>,
        /// Score threshold text.
        score_threshold: Option<String>,
    },
}

impl RawTarget {
    /// Google Maps target without a limit.
    #[must_use]
    pub fn maps(city: impl Into<String>, category: impl Into<String>) -> Self {
        Self::GoogleMaps {
            city: city.into(),
            category: category.into(),
            limit: None,
        }
    }

    /// Instagram target without optional fields.
    #[must_use]
    pub fn instagram(keyword: impl Into<String>) -> Self {
        Self::Instagram {
            keyword: keyword.into(),
            limit: None,
            followers_min: None,
            followers_max: None,
            score_threshold: None,
        }
    }

    /// Set the limit text.
    #[must_use]
    pub fn with_limit(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::GoogleMaps { limit, .. } | Self::Instagram { limit, .. } => {
                *limit = Some(value.into());
            }
        }
        self
    }

    /// Set follower bounds (Instagram only).
    #[must_use]
    pub fn with_followers(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        if let Self::Instagram {
            followers_min,
            followers_max,
            ..
        } = &mut self
        {
            *followers_min = Some(min.into());
            *followers_max = Some(max.into());
        }
        self
    }

    /// Set the score threshold (Instagram only).
    #[must_use]
    pub fn with_score_threshold(mut self, value: impl Into<String>) -> Self {
        if let Self::Instagram {
            score_threshold, ..
        } = &mut self
        {
            *score_threshold = Some(value.into());
        }
        self
    }

    /// Source this input belongs to.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::GoogleMaps { .. } => TargetKind::GoogleMaps,
            Self::Instagram { .. } => TargetKind::Instagram,
        }
    }
}

/// Case-insensitive deduplication key of a normalized target.
#[must_use]
pub fn identity_key(target: &ScrapeTarget) -> String {
    match target {
        ScrapeTarget::GoogleMaps(maps) => format!(
            "maps:{}|{}",
            maps.city.to_lowercase(),
            maps.category.to_lowercase()
        ),
        ScrapeTarget::Instagram(instagram) => {
            format!("instagram:{}", instagram.keyword.to_lowercase())
        }
    }
}

/// Result of merging new input into a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Queue after merging.
    pub queue: Vec<ScrapeTarget>,
    /// Identity keys that were not present before.
    pub added_count: usize,
    /// Incoming records that replaced an existing entry.
    pub replaced_count: usize,
    /// Incoming records rejected by normalization.
    pub rejected_count: usize,
}

/// Counts reported for a bulk paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkReport {
    /// Non-blank lines examined.
    pub lines_considered: usize,
    /// Lines that produced a valid target.
    pub accepted: usize,
    /// Lines dropped for too few fields or failed normalization.
    pub dropped: usize,
    /// Net-new identity keys added to the queue.
    pub added: usize,
}

/// Validates, clamps and deduplicates scrape targets.
#[derive(Debug, Clone)]
pub struct TargetNormalizer {
    limits: TargetConfig,
    sanitizer: Regex,
}

impl TargetNormalizer {
    /// Build a normalizer from configured bounds.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Pattern`] if the sanitizer fails to compile.
    pub fn new(limits: TargetConfig) -> Result<Self, QueueError> {
        let sanitizer =
            Regex::new(SANITIZE_PATTERN).map_err(|source| QueueError::Pattern { source })?;
        Ok(Self { limits, sanitizer })
    }

    /// Configured bounds.
    #[must_use]
    pub const fn limits(&self) -> &TargetConfig {
        &self.limits
    }

    /// Normalize one record, or reject it when identity fields end up empty.
    #[must_use]
    pub fn normalize(&self, raw: &RawTarget) -> Option<ScrapeTarget> {
        match raw {
            RawTarget::GoogleMaps {
                city,
                category,
                limit,
            } => {
                let city = self.identity_field(city, MAX_PLACE_CHARS)?;
                let category = self.identity_field(category, MAX_PLACE_CHARS)?;
                Some(ScrapeTarget::GoogleMaps(GoogleMapsTarget {
                    city,
                    category,
                    limit: self.limit(limit.as_deref()),
                }))
            }
            RawTarget::Instagram {
                keyword,
                limit,
                followers_min,
                followers_max,
                score_threshold,
            } => {
                let keyword = self.identity_field(keyword, MAX_KEYWORD_CHARS)?;
                let mut min = self.followers(followers_min.as_deref());
                let mut max = self.followers(followers_max.as_deref());
                if let (Some(low), Some(high)) = (min, max)
                    && low > high
                {
                    min = Some(high);
                    max = Some(low);
                }
                Some(ScrapeTarget::Instagram(InstagramTarget {
                    keyword,
                    limit: self.limit(limit.as_deref()),
                    followers_min: min,
                    followers_max: max,
                    score_threshold: self.score(score_threshold.as_deref()),
                }))
            }
        }
    }

    /// Merge `incoming` into `existing`.
    ///
    /// Rejected records are discarded; a record whose identity key is already
    /// queued replaces that entry in place.
    #[must_use]
    pub fn merge_into<'a, I>(&self, existing: Vec<ScrapeTarget>, incoming: I) -> MergeOutcome
    where
        I: IntoIterator<Item = &'a RawTarget>,
    {
        let mut queue = existing;
        let mut keys: Vec<String> = queue.iter().map(identity_key).collect();
        let mut added_count = 0;
        let mut replaced_count = 0;
        let mut rejected_count = 0;
        for raw in incoming {
            let Some(target) = self.normalize(raw) else {
                rejected_count += 1;
                continue;
            };
            let key = identity_key(&target);
            if let Some(position) = keys.iter().position(|existing| *existing == key) {
                queue[position] = target;
                replaced_count += 1;
            } else {
                keys.push(key);
                queue.push(target);
                added_count += 1;
            }
        }
        MergeOutcome {
            queue,
            added_count,
            replaced_count,
            rejected_count,
        }
    }

    /// Split pasted text into raw records of `kind`.
    ///
    /// Returns the raw records that have enough fields and the number of
    /// non-blank lines examined.
    #[must_use]
    pub fn parse_bulk(&self, kind: TargetKind, text: &str) -> (Vec<RawTarget>, usize) {
        let mut considered = 0;
        let mut records = Vec::new();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            considered += 1;
            let fields: Vec<String> = line
                .split(|ch: char| self.limits.delimiters.contains(ch))
                .map(|field| field.trim().to_string())
                .collect();
            let field = |index: usize| fields.get(index).filter(|value| !value.is_empty()).cloned();
            let record = match kind {
                TargetKind::GoogleMaps if fields.len() >= 2 => Some(RawTarget::GoogleMaps {
                    city: fields[0].clone(),
                    category: fields[1].clone(),
                    limit: field(2),
                }),
                TargetKind::Instagram if !fields.is_empty() => Some(RawTarget::Instagram {
                    keyword: fields[0].clone(),
                    limit: field(1),
                    followers_min: field(2),
                    followers_max: field(3),
                    score_threshold: field(4),
                }),
                _ => None,
            };
            records.extend(record);
        }
        (records, considered)
    }

    /// Parse pasted text and merge the valid lines into `existing`.
    #[must_use]
    pub fn merge_bulk(
        &self,
        kind: TargetKind,
        existing: Vec<ScrapeTarget>,
        text: &str,
    ) -> (MergeOutcome, BulkReport) {
        let (records, considered) = self.parse_bulk(kind, text);
        let outcome = self.merge_into(existing, &records);
        let accepted = records.len() - outcome.rejected_count;
        let report = BulkReport {
            lines_considered: considered,
            accepted,
            dropped: considered - accepted,
            added: outcome.added_count,
        };
        (outcome, report)
    }

    fn identity_field(&self, raw: &str, max_chars: usize) -> Option<String> {
        let stripped = self.sanitizer.replace_all(raw.trim(), "");
        let truncated: String = stripped.chars().take(max_chars).collect();
        let cleaned = truncated.trim();
        (!cleaned.is_empty()).then(|| cleaned.to_string())
    }

    fn limit(&self, raw: Option<&str>) -> u32 {
        let Some(value) = raw.and_then(parse_integer) else {
            return self.limits.default_limit;
        };
        let clamped = value.clamp(
            i64::from(self.limits.min_limit),
            i64::from(self.limits.max_limit),
        );
        u32::try_from(clamped).unwrap_or(self.limits.default_limit)
    }

    fn followers(&self, raw: Option<&str>) -> Option<u64> {
        let value = raw.and_then(parse_integer)?;
        Some(u64::try_from(value.max(0)).map_or(0, |count| count.min(self.limits.followers_ceiling)))
    }

    fn score(&self, raw: Option<&str>) -> Option<u8> {
        let value = raw.and_then(parse_integer)?;
        let clamped = value.clamp(0, i64::from(self.limits.score_ceiling));
        u8::try_from(clamped).ok()
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TargetNormalizer {
        match TargetNormalizer::new(TargetConfig::default()) {
            Ok(normalizer) => normalizer,
            Err(err) => panic!("sanitizer should compile: {err}"),
        }
    }

    fn maps(target: Option<ScrapeTarget>) -> GoogleMapsTarget {
        match target {
            Some(ScrapeTarget::GoogleMaps(maps)) => maps,
            other => panic!("expected maps target, got {other:?}"),
        }
    }

    fn instagram(target: Option<ScrapeTarget>) -> InstagramTarget {
        match target {
            Some(ScrapeTarget::Instagram(instagram)) => instagram,
            other => panic!("expected instagram target, got {other:?}"),
        }
    }

    #[test]
    fn limits_clamp_and_default() {
        let normalizer = normalizer();
        let base = RawTarget::maps("London", "Dentist");
        assert_eq!(maps(normalizer.normalize(&base.clone().with_limit("9999"))).limit, 200);
        assert_eq!(maps(normalizer.normalize(&base.clone().with_limit("0"))).limit, 1);
        assert_eq!(maps(normalizer.normalize(&base.clone().with_limit("-5"))).limit, 1);
        assert_eq!(maps(normalizer.normalize(&base.clone().with_limit("twelve"))).limit, 50);
        assert_eq!(maps(normalizer.normalize(&base.clone().with_limit("12.5"))).limit, 50);
        assert_eq!(maps(normalizer.normalize(&base)).limit, 50);
    }

    #[test]
    fn follower_bounds_swap_and_clamp() {
        let normalizer = normalizer();
        let swapped = instagram(
            normalizer.normalize(&RawTarget::instagram("yoga").with_followers("500", "100")),
        );
        assert_eq!(swapped.followers_min, Some(100));
        assert_eq!(swapped.followers_max, Some(500));

        let clamped = instagram(
            normalizer.normalize(&RawTarget::instagram("yoga").with_followers("-3", "99999999")),
        );
        assert_eq!(clamped.followers_min, Some(0));
        assert_eq!(clamped.followers_max, Some(10_000_000));
    }

    #[test]
    fn score_threshold_clamps() {
        let normalizer = normalizer();
        let high = instagram(
            normalizer.normalize(&RawTarget::instagram("cafe").with_score_threshold("250")),
        );
        assert_eq!(high.score_threshold, Some(100));
        let junk = instagram(
            normalizer.normalize(&RawTarget::instagram("cafe").with_score_threshold("high")),
        );
        assert_eq!(junk.score_threshold, None);
    }

    #[test]
    fn identity_fields_are_trimmed_sanitized_and_required() {
        let normalizer = normalizer();
        let cleaned = maps(normalizer.normalize(&RawTarget::maps("  São Paulo<script>  ", "Gym; DROP")));
        assert_eq!(cleaned.city, "São Pauloscript");
        assert_eq!(cleaned.category, "Gym DROP");

        assert!(normalizer.normalize(&RawTarget::maps("   ", "Gym")).is_none());
        assert!(normalizer.normalize(&RawTarget::maps("Paris", "<>")).is_none());
        assert!(normalizer.normalize(&RawTarget::instagram("")).is_none());
    }

    #[test]
    fn identity_fields_are_truncated() {
        let normalizer = normalizer();
        let long_city = "a".repeat(150);
        let target = maps(normalizer.normalize(&RawTarget::maps(long_city, "Gym")));
        assert_eq!(target.city.chars().count(), 100);

        let long_keyword = "k".repeat(250);
        let target = instagram(normalizer.normalize(&RawTarget::instagram(long_keyword)));
        assert_eq!(target.keyword.chars().count(), 200);
    }

    #[test]
    fn identity_key_ignores_case() {
        let normalizer = normalizer();
        let upper = normalizer.normalize(&RawTarget::maps("LONDON", "Dentist"));
        let lower = normalizer.normalize(&RawTarget::maps("london", "dentist"));
        assert_eq!(
            upper.as_ref().map(identity_key),
            lower.as_ref().map(identity_key)
        );
        assert_eq!(
            upper.as_ref().map(identity_key).as_deref(),
            Some("maps:london|dentist")
        );
    }

    #[test]
    fn merging_duplicates_keeps_last_write() {
        let normalizer = normalizer();
        let first = RawTarget::maps("London", "Dentist").with_limit("50");
        let second = RawTarget::maps("london", "DENTIST").with_limit("20");
        let outcome = normalizer.merge_into(Vec::new(), [&first, &second]);
        assert_eq!(outcome.added_count, 1);
        assert_eq!(outcome.replaced_count, 1);
        assert_eq!(outcome.queue.len(), 1);
        let only = maps(outcome.queue.into_iter().next());
        assert_eq!(only.city, "london");
        assert_eq!(only.limit, 20);
    }

    #[test]
    fn merge_preserves_positions_of_replaced_entries() {
        let normalizer = normalizer();
        let seed = normalizer
            .merge_into(
                Vec::new(),
                [
                    &RawTarget::maps("Austin", "HVAC"),
                    &RawTarget::maps("Miami", "Dentist"),
                ],
            )
            .queue;
        let outcome = normalizer.merge_into(
            seed,
            [
                &RawTarget::maps("AUSTIN", "hvac").with_limit("10"),
                &RawTarget::maps("Tampa", "Gym"),
                &RawTarget::maps("", "Gym"),
            ],
        );
        assert_eq!(outcome.added_count, 1);
        assert_eq!(outcome.rejected_count, 1);
        let keys: Vec<String> = outcome.queue.iter().map(identity_key).collect();
        assert_eq!(keys, ["maps:austin|hvac", "maps:miami|dentist", "maps:tampa|gym"]);
    }

    #[test]
    fn bulk_paste_drops_short_and_invalid_lines() {
        let normalizer = normalizer();
        let text = "London, Dentist, 50\nMumbai, Gym\n, Plumber, 20\n\n   \n";
        let (outcome, report) = normalizer.merge_bulk(TargetKind::GoogleMaps, Vec::new(), text);
        assert_eq!(report.lines_considered, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.added, 2);
        let targets: Vec<GoogleMapsTarget> =
            outcome.queue.into_iter().map(|target| maps(Some(target))).collect();
        assert_eq!(
            targets,
            vec![
                GoogleMapsTarget {
                    city: "London".into(),
                    category: "Dentist".into(),
                    limit: 50
                },
                GoogleMapsTarget {
                    city: "Mumbai".into(),
                    category: "Gym".into(),
                    limit: 50
                },
            ]
        );
    }

    #[test]
    fn bulk_paste_accepts_pipe_delimiters_and_instagram_fields() {
        let normalizer = normalizer();
        let text = "yoga studio | 40 | 1000 | 500 | 70\nsingle-field-line\nOnlyCity";
        let (maps_records, considered) = normalizer.parse_bulk(TargetKind::GoogleMaps, text);
        assert_eq!(considered, 3);
        assert_eq!(maps_records.len(), 1);

        let (outcome, report) = normalizer.merge_bulk(TargetKind::Instagram, Vec::new(), text);
        assert_eq!(report.accepted, 3);
        let first = instagram(outcome.queue.into_iter().next());
        assert_eq!(first.keyword, "yoga studio");
        assert_eq!(first.limit, 40);
        assert_eq!(first.followers_min, Some(500));
        assert_eq!(first.followers_max, Some(1_000));
        assert_eq!(first.score_threshold, Some(70));
    }
}
