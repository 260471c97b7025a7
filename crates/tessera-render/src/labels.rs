//! Label collision resolution.
//!
//! Labels arrive grouped by series. Overlapping labels from different series are merged into
//! positioning groups; a group's members are re-stacked vertically so none overlap while
//! keeping their top-to-bottom order. Labels without bounds never take part.

use tessera_core::BBox;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Current bounds; `None` when the label could not be measured.
    pub bounds: Option<BBox>,
    original_y: f64,
    pub removed: bool,
    /// Index into the groups returned by [`group_labels`].
    pub group: Option<usize>,
}

impl Label {
    pub fn new(bounds: BBox) -> Self {
        Self {
            bounds: Some(bounds),
            original_y: bounds.y,
            removed: false,
            group: None,
        }
    }

    pub fn unmeasured() -> Self {
        Self {
            bounds: None,
            original_y: 0.0,
            removed: false,
            group: None,
        }
    }

    /// Vertical position before any grouping moved it.
    pub fn original_y(&self) -> f64 {
        self.original_y
    }

    pub fn y(&self) -> Option<f64> {
        self.bounds.map(|b| b.y)
    }

    fn active_bounds(&self) -> Option<BBox> {
        if self.removed { None } else { self.bounds }
    }
}

/// `(series, index)` of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelRef {
    pub series: usize,
    pub index: usize,
}

impl LabelRef {
    pub fn new(series: usize, index: usize) -> Self {
        Self { series, index }
    }
}

/// Hides every label whose horizontal range overlaps the previous visible label of its series.
pub fn remove_overlapping_within_series(labels: &mut [Vec<Label>]) {
    for series in labels.iter_mut() {
        let mut prev: Option<BBox> = None;
        for label in series.iter_mut() {
            let Some(bounds) = label.active_bounds() else {
                continue;
            };
            if prev.is_some_and(|p| bounds.overlaps_horizontally(&p)) {
                label.removed = true;
            } else {
                prev = Some(bounds);
            }
        }
    }
}

/// Groups overlapping labels across series and re-stacks each group.
///
/// Series are compared pairwise in index order (a series is never compared with itself).
/// Returns the non-empty groups; `Label::group` indexes into the returned list.
pub fn group_labels(labels: &mut [Vec<Label>]) -> Vec<Vec<LabelRef>> {
    let mut groups: Vec<Vec<LabelRef>> = Vec::new();

    for series_a in 0..labels.len() {
        for series_b in (series_a + 1)..labels.len() {
            for index_b in 0..labels[series_b].len() {
                for index_a in 0..labels[series_a].len() {
                    let a = LabelRef::new(series_a, index_a);
                    let b = LabelRef::new(series_b, index_b);
                    let (Some(bounds_a), Some(bounds_b)) = (
                        labels[series_a][index_a].active_bounds(),
                        labels[series_b][index_b].active_bounds(),
                    ) else {
                        continue;
                    };
                    if !bounds_a.overlaps(&bounds_b) {
                        continue;
                    }

                    let group_a = labels[series_a][index_a].group;
                    let group_b = labels[series_b][index_b].group;
                    let target = match (group_a, group_b) {
                        (Some(ga), Some(gb)) if ga == gb => continue,
                        (Some(ga), Some(gb)) => {
                            let (into, from) = if groups[gb].len() > groups[ga].len() {
                                (gb, ga)
                            } else {
                                (ga, gb)
                            };
                            let moved = std::mem::take(&mut groups[from]);
                            for r in &moved {
                                labels[r.series][r.index].group = Some(into);
                            }
                            groups[into].extend(moved);
                            into
                        }
                        (Some(g), None) => {
                            groups[g].push(b);
                            labels[series_b][index_b].group = Some(g);
                            g
                        }
                        (None, Some(g)) => {
                            groups[g].push(a);
                            labels[series_a][index_a].group = Some(g);
                            g
                        }
                        (None, None) => {
                            let g = groups.len();
                            groups.push(vec![a, b]);
                            labels[series_a][index_a].group = Some(g);
                            labels[series_b][index_b].group = Some(g);
                            g
                        }
                    };
                    tracing::trace!(?a, ?b, group = target, "labels grouped");
                    update_group_positions(labels, &groups[target]);
                }
            }
        }
    }

    // Compact away groups emptied by merges.
    let mut remap = vec![None; groups.len()];
    let mut out = Vec::new();
    for (old, members) in groups.into_iter().enumerate() {
        if members.is_empty() {
            continue;
        }
        remap[old] = Some(out.len());
        out.push(members);
    }
    for series in labels.iter_mut() {
        for label in series.iter_mut() {
            label.group = label.group.and_then(|g| remap[g]);
        }
    }
    out
}

/// Within-series removal followed by cross-series grouping.
pub fn resolve(labels: &mut [Vec<Label>]) -> Vec<Vec<LabelRef>> {
    remove_overlapping_within_series(labels);
    let groups = group_labels(labels);
    tracing::debug!(groups = groups.len(), "label collisions resolved");
    groups
}

/// Restacks `members` from their original positions, bottom-most first.
fn update_group_positions(labels: &mut [Vec<Label>], members: &[LabelRef]) {
    let mut order: Vec<LabelRef> = members
        .iter()
        .copied()
        .filter(|r| labels[r.series][r.index].bounds.is_some())
        .collect();
    order.sort_by(|a, b| {
        let ya = labels[a.series][a.index].original_y;
        let yb = labels[b.series][b.index].original_y;
        yb.total_cmp(&ya)
    });

    let mut placed: Vec<BBox> = Vec::with_capacity(order.len());
    for r in &order {
        let label = &labels[r.series][r.index];
        let Some(bounds) = label.bounds else {
            continue;
        };
        let mut b = BBox {
            y: label.original_y,
            ..bounds
        };
        for _ in 0..=placed.len() {
            match placed.iter().rev().find(|p| b.overlaps(p)) {
                Some(p) => b.y = p.y - b.height,
                None => break,
            }
        }
        placed.push(b);
    }

    for (r, b) in order.iter().zip(placed) {
        labels[r.series][r.index].bounds = Some(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(x: f64, y: f64) -> Label {
        Label::new(BBox::new(x, y, 20.0, 10.0))
    }

    #[test]
    fn within_series_removal_compares_with_previous_kept_label() {
        let mut labels = vec![vec![label(0.0, 0.0), label(10.0, 50.0), label(25.0, 0.0)]];
        remove_overlapping_within_series(&mut labels);
        let removed: Vec<_> = labels[0].iter().map(|l| l.removed).collect();
        assert_eq!(removed, [false, true, false]);
    }

    #[test]
    fn labels_in_one_series_are_never_grouped() {
        let mut labels = vec![vec![label(0.0, 0.0), label(0.0, 5.0)]];
        assert!(group_labels(&mut labels).is_empty());
        assert_eq!(labels[0][1].y(), Some(5.0));
    }

    #[test]
    fn overlapping_pair_is_stacked() {
        let mut labels = vec![vec![label(0.0, 0.0)], vec![label(5.0, 4.0)]];
        let groups = group_labels(&mut labels);
        assert_eq!(groups.len(), 1);
        assert_eq!(labels[1][0].y(), Some(4.0));
        assert_eq!(labels[0][0].y(), Some(-6.0));
        assert_eq!(labels[0][0].group, Some(0));
    }

    #[test]
    fn unmeasured_and_removed_labels_are_skipped() {
        let mut hidden = label(0.0, 0.0);
        hidden.removed = true;
        let mut labels = vec![
            vec![Label::unmeasured(), hidden],
            vec![label(0.0, 2.0)],
        ];
        assert!(group_labels(&mut labels).is_empty());
        assert_eq!(labels[1][0].group, None);
    }

    #[test]
    fn bridging_label_merges_groups() {
        let mut labels = vec![
            vec![Label::new(BBox::new(0.0, 8.0, 20.0, 10.0)), label(100.0, 0.0)],
            vec![Label::new(BBox::new(200.0, 50.0, 20.0, 10.0)), label(100.0, 4.0)],
            vec![Label::new(BBox::new(0.0, 10.0, 120.0, 10.0))],
        ];
        let groups = group_labels(&mut labels);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 4);
        assert_eq!(labels[1][0].group, None);

        let members: Vec<BBox> = groups[0]
            .iter()
            .map(|r| labels[r.series][r.index].bounds.unwrap())
            .collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }
}
