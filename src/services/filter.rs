use std::collections::BTreeSet;

use color_eyre::eyre::{Result, WrapErr};
use regex::{Regex, RegexBuilder};

use crate::ports::spotify::SpotifyApiTrack;

// regex's own defaults, used as the floor for small keyword sets.
const MIN_SIZE_LIMIT: usize = 10 * (1 << 20);
const MIN_DFA_SIZE_LIMIT: usize = 2 * (1 << 20);
// Case folding expands every pattern byte into several compiled states.
const COMPILED_BYTES_PER_PATTERN_BYTE: usize = 512;

/// Decides whether a track survives based on a set of banned keywords.
///
/// Keywords are literal, case-insensitive substrings. They are compiled once
/// into a single alternation so the cost of a lookup does not grow with a scan
/// over every keyword.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    matcher: Option<Regex>,
}

impl KeywordFilter {
    pub fn new<I, S>(banned_keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: BTreeSet<String> = banned_keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();

        if keywords.is_empty() {
            return Ok(Self { matcher: None });
        }

        let pattern = keywords
            .iter()
            .map(|keyword| regex::escape(keyword))
            .collect::<Vec<_>>()
            .join("|");

        let budget = pattern.len().saturating_mul(COMPILED_BYTES_PER_PATTERN_BYTE);
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(budget.max(MIN_SIZE_LIMIT))
            .dfa_size_limit(budget.max(MIN_DFA_SIZE_LIMIT))
            .build()
            .wrap_err("Failed to build banned keyword matcher")?;

        Ok(Self {
            matcher: Some(matcher),
        })
    }

    /// Returns false iff some banned keyword occurs in `track_name`.
    pub fn keep(&self, track_name: &str) -> bool {
        match &self.matcher {
            Some(matcher) => !matcher.is_match(track_name),
            None => true,
        }
    }

    /// Splits `tracks` into (kept, removed), preserving the original order in both.
    pub fn partition(
        &self,
        tracks: Vec<SpotifyApiTrack>,
    ) -> (Vec<SpotifyApiTrack>, Vec<SpotifyApiTrack>) {
        tracks.into_iter().partition(|track| self.keep(&track.name))
    }
}
