//! Timeline table mapping playback time to document pages.
//!
//! Only the first few items of a recording are usually timed by hand. The
//! rest of the table is extrapolated from the last authored entry using a
//! fixed average item duration, advancing one page every `items_per_page`
//! items and pinning at the final page of the document.

use crate::config::{AppConfig, TimelineAnchor};
use anyhow::{Result, bail};

/// Parameters for [`Timeline::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSpec {
    pub prefix: Vec<TimelineAnchor>,
    pub average_item_secs: f64,
    pub item_count: usize,
    pub total_pages: u32,
    pub items_per_page: usize,
}

impl From<&AppConfig> for TimelineSpec {
    fn from(config: &AppConfig) -> Self {
        TimelineSpec {
            prefix: config.timeline_prefix.clone(),
            average_item_secs: config.average_item_secs,
            item_count: config.item_count,
            total_pages: config.total_pages,
            items_per_page: config.items_per_page,
        }
    }
}

/// Immutable, strictly time-ordered table of item start times and pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineAnchor>,
    total_pages: u32,
}

impl Timeline {
    /// Build the full table from an authored prefix plus extrapolation.
    pub fn build(spec: &TimelineSpec) -> Result<Self> {
        validate(spec)?;

        let mut entries: Vec<TimelineAnchor> =
            spec.prefix.iter().take(spec.item_count).copied().collect();
        let Some(last) = entries.last().copied() else {
            bail!("timeline prefix is empty");
        };

        let mut at = last.at;
        let mut page = last.page;
        for idx in entries.len()..spec.item_count {
            at += spec.average_item_secs;
            if idx % spec.items_per_page == 0 {
                page = page.saturating_add(1);
            }
            entries.push(TimelineAnchor {
                at,
                page: page.min(spec.total_pages),
            });
        }

        Ok(Self {
            entries,
            total_pages: spec.total_pages,
        })
    }

    pub fn entries(&self) -> &[TimelineAnchor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Index of the last entry whose threshold has been reached at `time`.
    pub fn item_index_at(&self, time: f64) -> Option<usize> {
        let time = if time.is_finite() { time } else { 0.0 };
        self.entries.iter().rposition(|entry| time >= entry.at)
    }

    /// Page that should be visible at `time`; page 1 before the first item.
    pub fn page_at(&self, time: f64) -> u32 {
        self.item_index_at(time)
            .map(|idx| self.entries[idx].page)
            .unwrap_or(1)
    }
}

fn validate(spec: &TimelineSpec) -> Result<()> {
    if spec.prefix.is_empty() {
        bail!("timeline prefix is empty");
    }
    if spec.item_count == 0 {
        bail!("timeline item_count must be at least 1");
    }
    if spec.total_pages == 0 {
        bail!("timeline total_pages must be at least 1");
    }
    if spec.items_per_page == 0 {
        bail!("timeline items_per_page must be at least 1");
    }
    if !spec.average_item_secs.is_finite() || spec.average_item_secs <= 0.0 {
        bail!(
            "timeline average_item_secs must be positive, got {}",
            spec.average_item_secs
        );
    }

    let mut previous: Option<TimelineAnchor> = None;
    for (idx, anchor) in spec.prefix.iter().enumerate() {
        if !anchor.at.is_finite() || anchor.at < 0.0 {
            bail!("timeline entry {idx} has invalid timestamp {}", anchor.at);
        }
        if anchor.page == 0 || anchor.page > spec.total_pages {
            bail!(
                "timeline entry {idx} page {} is outside 1..={}",
                anchor.page,
                spec.total_pages
            );
        }
        if let Some(prev) = previous {
            if anchor.at <= prev.at {
                bail!(
                    "timeline entry {idx} at {}s does not follow {}s",
                    anchor.at,
                    prev.at
                );
            }
            if anchor.page < prev.page {
                bail!(
                    "timeline entry {idx} page {} goes back from page {}",
                    anchor.page,
                    prev.page
                );
            }
        }
        previous = Some(*anchor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(pairs: &[(f64, u32)]) -> Vec<TimelineAnchor> {
        pairs
            .iter()
            .map(|&(at, page)| TimelineAnchor { at, page })
            .collect()
    }

    fn stock_spec() -> TimelineSpec {
        TimelineSpec::from(&AppConfig::default())
    }

    fn assert_table_invariants(timeline: &Timeline, spec: &TimelineSpec) {
        assert_eq!(timeline.len(), spec.item_count);
        for pair in timeline.entries().windows(2) {
            assert!(pair[1].at > pair[0].at, "thresholds must strictly increase");
            assert!(pair[1].page >= pair[0].page, "pages must not decrease");
        }
        assert!(
            timeline
                .entries()
                .iter()
                .all(|e| e.page >= 1 && e.page <= spec.total_pages)
        );
    }

    #[test]
    fn stock_table_matches_authored_recitation() {
        let spec = stock_spec();
        let timeline = Timeline::build(&spec).expect("stock timeline");
        assert_table_invariants(&timeline, &spec);

        let entries = timeline.entries();
        assert_eq!(entries[7], TimelineAnchor { at: 673.0, page: 8 });
        // Item 8 advances the page, item 9 shares it.
        assert_eq!(entries[8], TimelineAnchor { at: 757.0, page: 9 });
        assert_eq!(entries[9], TimelineAnchor { at: 841.0, page: 9 });
        assert_eq!(entries[10], TimelineAnchor { at: 925.0, page: 10 });
        assert_eq!(entries.last().map(|e| e.page), Some(55));
    }

    #[test]
    fn invariants_hold_across_shapes() {
        for item_count in [1usize, 2, 3, 9, 40, 200] {
            for total_pages in [1u32, 2, 7, 55] {
                for items_per_page in [1usize, 2, 3] {
                    let spec = TimelineSpec {
                        prefix: anchors(&[(1.0, 1)]),
                        average_item_secs: 12.5,
                        item_count,
                        total_pages,
                        items_per_page,
                    };
                    let timeline = Timeline::build(&spec).expect("valid spec");
                    assert_table_invariants(&timeline, &spec);
                }
            }
        }
    }

    #[test]
    fn prefix_longer_than_item_count_is_truncated() {
        let spec = TimelineSpec {
            prefix: anchors(&[(0.0, 1), (10.0, 1), (20.0, 2)]),
            average_item_secs: 10.0,
            item_count: 2,
            total_pages: 3,
            items_per_page: 2,
        };
        let timeline = Timeline::build(&spec).expect("truncated timeline");
        assert_eq!(timeline.entries(), anchors(&[(0.0, 1), (10.0, 1)]).as_slice());
    }

    #[test]
    fn rejects_malformed_specs() {
        let base = TimelineSpec {
            prefix: anchors(&[(1.0, 1), (93.0, 2)]),
            average_item_secs: 84.0,
            item_count: 10,
            total_pages: 5,
            items_per_page: 2,
        };
        assert!(Timeline::build(&base).is_ok());

        let mut spec = base.clone();
        spec.prefix.clear();
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.prefix = anchors(&[(93.0, 1), (93.0, 2)]);
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.prefix = anchors(&[(1.0, 3), (93.0, 2)]);
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.prefix = anchors(&[(1.0, 0)]);
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.prefix = anchors(&[(1.0, 6)]);
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.average_item_secs = f64::NAN;
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base.clone();
        spec.items_per_page = 0;
        assert!(Timeline::build(&spec).is_err());

        let mut spec = base;
        spec.item_count = 0;
        assert!(Timeline::build(&spec).is_err());
    }

    #[test]
    fn page_lookup_prefers_last_threshold_met() {
        let spec = TimelineSpec {
            prefix: anchors(&[(1.0, 1), (93.0, 2), (120.0, 2), (150.0, 4)]),
            average_item_secs: 30.0,
            item_count: 4,
            total_pages: 4,
            items_per_page: 2,
        };
        let timeline = Timeline::build(&spec).expect("timeline");
        assert_eq!(timeline.page_at(0.0), 1);
        assert_eq!(timeline.page_at(0.99), 1);
        assert_eq!(timeline.page_at(92.999), 1);
        assert_eq!(timeline.page_at(93.0), 2);
        assert_eq!(timeline.page_at(149.0), 2);
        assert_eq!(timeline.page_at(150.0), 4);
        assert_eq!(timeline.page_at(1e9), 4);
        assert_eq!(timeline.item_index_at(0.5), None);
        assert_eq!(timeline.item_index_at(121.0), Some(2));
        assert_eq!(timeline.page_at(f64::NAN), 1);
    }

    #[test]
    fn target_page_is_monotonic_in_time() {
        let timeline = Timeline::build(&stock_spec()).expect("stock timeline");
        let mut previous = 0;
        let mut t = 0.0;
        while t < 10_000.0 {
            let page = timeline.page_at(t);
            assert!(page >= previous, "page went back at t={t}");
            previous = page;
            t += 7.25;
        }
        assert_eq!(previous, 55);
    }
}
