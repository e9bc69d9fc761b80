// Onset filters
// Each filter only removes candidates; order and timestamps are never changed

/// Beat-proximity thresholds for the combined method
#[derive(Debug, Clone, PartialEq)]
pub struct BeatFilterPolicy {
    /// An onset is kept when its nearest beat is closer than this (seconds)
    pub max_distance_secs: f64,

    /// If fewer than this fraction of onsets survive, the filter is skipped
    /// and the unfiltered onsets are returned instead
    pub min_keep_ratio: f64,
}

impl Default for BeatFilterPolicy {
    fn default() -> Self {
        BeatFilterPolicy {
            max_distance_secs: 0.2,
            min_keep_ratio: 0.3,
        }
    }
}

/// A single step of the post-processing chain
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Greedy refractory period: drop onsets closer than `min_gap_secs` to the last kept one
    Refractory { min_gap_secs: f64 },

    /// Drop onsets earlier than this time (seconds)
    MinTime(f64),

    /// Drop onsets later than this time (seconds)
    MaxTime(f64),

    /// Keep onsets near a tracked beat, with over-pruning rollback
    BeatProximity {
        beats: Vec<f64>,
        policy: BeatFilterPolicy,
    },
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Refractory { .. } => "refractory",
            Filter::MinTime(_) => "min_time",
            Filter::MaxTime(_) => "max_time",
            Filter::BeatProximity { .. } => "beat_proximity",
        }
    }

    pub fn apply(&self, onsets: &[f64]) -> Vec<f64> {
        match self {
            Filter::Refractory { min_gap_secs } => refractory(onsets, *min_gap_secs),
            Filter::MinTime(min) => {
                let kept = drop_before(onsets, *min);
                let dropped = onsets.len() - kept.len();
                if dropped > 0 {
                    log::info!(
                        "Filtered out {} onsets before {}s (likely false positives)",
                        dropped,
                        min
                    );
                }
                kept
            }
            Filter::MaxTime(max) => {
                let kept = drop_after(onsets, *max);
                let dropped = onsets.len() - kept.len();
                if dropped > 0 {
                    log::info!("Filtered out {} onsets beyond {}s", dropped, max);
                }
                kept
            }
            Filter::BeatProximity { beats, policy } => beat_proximity(onsets, beats, policy),
        }
    }
}

/// Ordered sequence of filters, each consuming the previous one's output
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        FilterChain {
            filters: Vec::new(),
        }
    }

    /// Append a filter to the end of the chain
    pub fn then(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn apply(&self, onsets: Vec<f64>) -> Vec<f64> {
        self.filters.iter().fold(onsets, |current, filter| {
            let next = filter.apply(&current);
            log::debug!(
                "{}: {} -> {} onsets",
                filter.name(),
                current.len(),
                next.len()
            );
            next
        })
    }
}

/// Keep the first onset, then each onset at least `min_gap_secs` after the
/// last kept one. A gap equal to `min_gap_secs` is allowed. Non-positive gaps
/// disable the filter.
pub fn refractory(onsets: &[f64], min_gap_secs: f64) -> Vec<f64> {
    if min_gap_secs <= 0.0 {
        return onsets.to_vec();
    }

    let mut kept = Vec::with_capacity(onsets.len());
    let mut last_kept: Option<f64> = None;

    for &onset in onsets {
        let keep = match last_kept {
            Some(last) => onset - last >= min_gap_secs,
            None => true,
        };
        if keep {
            kept.push(onset);
            last_kept = Some(onset);
        }
    }

    kept
}

/// Drop onsets strictly earlier than `min_secs`
pub fn drop_before(onsets: &[f64], min_secs: f64) -> Vec<f64> {
    onsets.iter().copied().filter(|&t| t >= min_secs).collect()
}

/// Drop onsets strictly later than `max_secs`
pub fn drop_after(onsets: &[f64], max_secs: f64) -> Vec<f64> {
    onsets.iter().copied().filter(|&t| t <= max_secs).collect()
}

/// Keep onsets whose nearest beat is within the policy distance
///
/// When no beats were tracked, or the filter would keep fewer than
/// `min_keep_ratio` of the onsets, the input is returned unchanged.
pub fn beat_proximity(onsets: &[f64], beats: &[f64], policy: &BeatFilterPolicy) -> Vec<f64> {
    if beats.is_empty() {
        return onsets.to_vec();
    }

    let filtered: Vec<f64> = onsets
        .iter()
        .copied()
        .filter(|&onset| {
            let nearest = beats
                .iter()
                .map(|beat| (beat - onset).abs())
                .fold(f64::INFINITY, f64::min);
            nearest < policy.max_distance_secs
        })
        .collect();

    if (filtered.len() as f64) < onsets.len() as f64 * policy.min_keep_ratio {
        log::warn!(
            "Beat filter kept only {} of {} onsets, using unfiltered onsets",
            filtered.len(),
            onsets.len()
        );
        return onsets.to_vec();
    }

    filtered
}
