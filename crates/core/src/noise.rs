//! Noise filter for diagnostic logging of server text.
//!
//! Only decides what gets logged; it never influences the session.

use regex::RegexSet;

/// Blocks matching any of these are not worth logging.
const NOISE_PATTERNS: [&str; 9] = [
    r"(?m)^\s*\*{4} Starting FICS session as",
    r"Welcome to the Free Internet Chess Server",
    r"(?m)^\s*\\?\s*\*\*ANNOUNCEMENT\*\*",
    r"(?m)^\s*\w+ (?:set to|unset)\b",
    r"(?m)^\s*Style \d+ set\.",
    r"(?m)^\s*You will (?:now|not) (?:hear|see)",
    r"(?m)^\s*You are now observing game \d+",
    r"(?m)^\s*Game \d+: \S+ \(\s*[\d+-]+\) \S+ \(\s*[\d+-]+\) (?:rated|unrated)",
    r"(?m)^\s*\(told \w+",
];

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    marker: String,
    patterns: RegexSet,
}

impl NoiseFilter {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.trim().to_string(),
            patterns: RegexSet::new(NOISE_PATTERNS).expect("noise patterns are valid"),
        }
    }

    /// Reduce a block of non-event lines to the text worth logging.
    ///
    /// Marker-only and blank lines are dropped; `None` means nothing is left or
    /// the block is known noise.
    pub fn diagnostic<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        let kept: Vec<&str> = lines
            .iter()
            .map(|l| l.as_ref().trim_end())
            .filter(|l| !l.trim().is_empty() && l.trim() != self.marker)
            .collect();
        if kept.is_empty() {
            return None;
        }

        let block = kept.join("\n");
        if self.patterns.is_match(&block) {
            return None;
        }
        Some(block)
    }
}
