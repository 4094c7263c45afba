//! Coarse robots.txt interpretation
//!
//! Only one signal is extracted: whether the file contains a
//! `disallow: /` directive (case-insensitive substring match). The result
//! is advisory and never blocks a fetch.

/// What a robots.txt file says about crawling the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotsRules {
    disallow_signal: bool,
}

impl RobotsRules {
    /// Interprets raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            disallow_signal: content.to_lowercase().contains("disallow: /"),
        }
    }

    /// Rules used when robots.txt is missing or could not be fetched
    pub fn allow_all() -> Self {
        Self {
            disallow_signal: false,
        }
    }

    pub fn has_disallow_signal(&self) -> bool {
        self.disallow_signal
    }
}
