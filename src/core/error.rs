//! Error types for the routeviz library
//!
//! Provides the error taxonomy for geometry preconditions, rendering,
//! and provider failures, plus fuzzy matching for routing profile names.

use std::fmt;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Routing profiles accepted by the directions provider.
///
/// Static list mirroring the OpenRouteService profile set. Kept static
/// rather than fetched: validation must work before any network call,
/// and the profile set changes rarely.
pub const VALID_PROFILES: &[&str] = &[
    "driving-car",
    "driving-hgv",
    "cycling-regular",
    "cycling-road",
    "cycling-mountain",
    "cycling-electric",
    "foot-walking",
    "foot-hiking",
    "wheelchair",
];

/// Find the best fuzzy match using hybrid character-based scoring.
///
/// Combines Jaro-Winkler (70%, strong for transposition/prefix typos)
/// with normalized Levenshtein (30%, better for insertions/deletions).
/// Compound profile names ("foot-walking") get a bonus when the input
/// closely matches one component, so "walking" still resolves.
///
/// Minimum threshold: 0.65 similarity.
fn find_best_fuzzy_match(input: &str, candidates: &[&str]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    let min_threshold = 0.65;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();

        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let combined_score = (jw_score * 0.7) + (lev_score * 0.3);

        // Component bonus: "walking" should pull toward "foot-walking"
        // even though the whole-string similarity is mediocre. Strict
        // threshold (>0.85) keeps short fragments from matching widely.
        let mut component_bonus = 0.0;
        if candidate_lower.contains('-') {
            for part in candidate_lower.split('-') {
                if part.len() >= 4 {
                    let part_similarity = jaro_winkler(&input_lower, part);
                    if part_similarity > 0.85 {
                        component_bonus += 0.12 * part_similarity;
                    }
                }
            }
        }

        let final_score = combined_score + component_bonus;

        if final_score >= min_threshold && final_score > best_score {
            best_score = final_score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Suggest a correction for a potentially misspelled routing profile.
///
/// Returns `None` when the input already matches a valid profile
/// (case-insensitively) or when nothing is close enough to suggest.
pub fn suggest_profile(profile: &str) -> Option<String> {
    for valid in VALID_PROFILES {
        if valid.eq_ignore_ascii_case(profile) {
            return None;
        }
    }

    // Bare component names map to their compound profile first
    // ("walking" is foot-walking, "car" is driving-car), before any
    // fuzzy scoring gets a chance to mislead.
    for valid in VALID_PROFILES {
        if valid
            .split('-')
            .any(|part| part.eq_ignore_ascii_case(profile))
        {
            return Some(valid.to_string());
        }
    }

    find_best_fuzzy_match(profile, VALID_PROFILES)
}

/// Check whether a profile name is one the directions provider accepts.
pub fn is_valid_profile(profile: &str) -> bool {
    VALID_PROFILES.iter().any(|p| p.eq_ignore_ascii_case(profile))
}

/// Main error type for routeviz operations
#[derive(Debug)]
pub enum Error {
    /// A geometry operation was given an empty coordinate sequence
    EmptyGeometry(String),

    /// Not enough data to render (empty elevation sample set)
    InsufficientData(String),

    /// Routing provider failure
    Routing { status: u16, message: String },

    /// Elevation provider failure
    Elevation(String),

    /// Traffic provider failure
    Traffic(String),

    /// A provider credential is not configured (feature unavailable,
    /// as opposed to a transient failure)
    MissingCredential(&'static str),

    /// HTTP-level error from a provider
    Http(String),

    /// Network connectivity issue
    Network(String),

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// File I/O error
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyGeometry(msg) => {
                write!(f, "Empty geometry: {msg}")
            }
            Error::InsufficientData(msg) => {
                write!(f, "Insufficient data: {msg}")
            }
            Error::Routing { status, message } => {
                write!(f, "Routing failed ({status}): {message}")
            }
            Error::Elevation(msg) => {
                write!(f, "Elevation lookup failed: {msg}")
            }
            Error::Traffic(msg) => {
                write!(f, "Traffic lookup failed: {msg}")
            }
            Error::MissingCredential(var) => {
                write!(f, "Provider credential {var} is not configured")
            }
            Error::Http(msg) => {
                write!(f, "HTTP error: {msg}")
            }
            Error::Network(msg) => {
                write!(f, "Network error: {msg}")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
            Error::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::Network(err.to_string())
        } else {
            Error::Http(err.to_string())
        }
    }
}

impl Error {
    /// Whether this error means "configure a credential", not "retry".
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::MissingCredential(_))
    }
}

/// Convenience result type for routeviz operations
pub type Result<T> = std::result::Result<T, Error>;
