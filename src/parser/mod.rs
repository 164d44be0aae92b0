mod line;
pub use line::{Line, LineReader};

mod content_line;
pub use content_line::{ContentLine, ContentLineError, ContentLineParams, ContentLineParser};

mod component;
pub use component::ComponentParser;

use crate::component::DeletionClassifier;
use crate::types::{UnresolvedZonePolicy, ZoneResolver, default_resolver};
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;

/// Occurrences generated per recurring event when the rule has no COUNT.
pub const DEFAULT_COUNT: u32 = 100;
/// Upper bound for the agenda returned by [`crate::parse_agenda`].
pub const DEFAULT_MAX_RESULTS: usize = 25;
/// How far past `now` recurrences are generated.
pub const DEFAULT_HORIZON: Months = Months::new(24);

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Reference point for the generation horizon and the agenda cutoff.
    pub now: DateTime<Utc>,
    pub horizon: Months,
    pub default_count: u32,
    pub max_results: usize,
    pub deletion: DeletionClassifier,
    pub zone_resolver: Arc<dyn ZoneResolver>,
    pub unresolved_zone: UnresolvedZonePolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            horizon: DEFAULT_HORIZON,
            default_count: DEFAULT_COUNT,
            max_results: DEFAULT_MAX_RESULTS,
            deletion: DeletionClassifier::default(),
            zone_resolver: default_resolver(),
            unresolved_zone: UnresolvedZonePolicy::default(),
        }
    }
}

impl ParserOptions {
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_horizon(mut self, horizon: Months) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_default_count(mut self, count: u32) -> Self {
        self.default_count = count;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_deletion(mut self, deletion: DeletionClassifier) -> Self {
        self.deletion = deletion;
        self
    }

    pub fn with_zone_resolver(mut self, resolver: Arc<dyn ZoneResolver>) -> Self {
        self.zone_resolver = resolver;
        self
    }

    pub fn with_unresolved_zone(mut self, policy: UnresolvedZonePolicy) -> Self {
        self.unresolved_zone = policy;
        self
    }

    /// Last instant recurrences may start at.
    pub fn horizon_end(&self) -> DateTime<Utc> {
        self.now
            .checked_add_months(self.horizon)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
