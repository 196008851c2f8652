use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Issue, Queue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSummary {
    pub component: String,
    pub counts: BTreeMap<Queue, usize>,
    pub total: usize,
}

impl ComponentSummary {
    pub fn count(&self, queue: Queue) -> usize {
        self.counts.get(&queue).copied().unwrap_or(0)
    }
}

/// Issues without a component are not counted.
pub fn count_by_component<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for issue in issues.into_iter().filter(|issue| !issue.component.is_empty()) {
        *counts.entry(issue.component.clone()).or_insert(0) += 1;
    }
    counts
}

/// Joins per-queue counts over the union of components and ranks them.
///
/// Rows are ordered by descending total, then by descending count in the
/// second queue of `per_queue` (if any), then by component name.
pub fn merge(per_queue: &[(Queue, BTreeMap<String, usize>)]) -> Vec<ComponentSummary> {
    let components: BTreeSet<&str> = per_queue
        .iter()
        .flat_map(|(_, counts)| counts.keys().map(String::as_str))
        .collect();

    let mut rows: Vec<ComponentSummary> = components
        .into_iter()
        .map(|component| {
            let counts: BTreeMap<Queue, usize> = per_queue
                .iter()
                .map(|(queue, counts)| (*queue, counts.get(component).copied().unwrap_or(0)))
                .collect();
            ComponentSummary {
                component: component.to_owned(),
                total: counts.values().sum(),
                counts,
            }
        })
        .collect();

    let secondary = per_queue.get(1).map(|(queue, _)| *queue);
    rows.sort_by_key(|row| {
        (
            Reverse(row.total),
            Reverse(secondary.map_or(0, |queue| row.count(queue))),
        )
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn issues(components: &[&str]) -> Vec<Issue> {
        components
            .iter()
            .map(|c| Issue::new(c, "11.x-dev", 1))
            .collect()
    }

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(c, n)| (c.to_string(), *n)).collect()
    }

    #[test]
    fn filtered_counts_per_component() {
        let fetched = vec![
            Issue::new("A", "9", 1),
            Issue::new("A", "8", 1),
            Issue::new("B", "9", 1),
        ];
        let relevant = Filter::new(vec!["8".into()], vec![]).apply(fetched);
        assert_eq!(
            count_by_component(&relevant),
            counts(&[("A", 1), ("B", 1)])
        );
    }

    #[test]
    fn issues_without_component_are_skipped() {
        let fetched = issues(&["views", "", "views", ""]);
        assert_eq!(count_by_component(&fetched), counts(&[("views", 2)]));

        let rows = merge(&[(Queue::NeedsReview, count_by_component(&issues(&[""])))]);
        assert!(rows.is_empty());
    }

    #[test]
    fn merges_union_of_components_with_zero_defaults() {
        let nr = count_by_component(&issues(&["views", "views", "node system"]));
        let rtbc = count_by_component(&issues(&["views", "ajax system"]));
        let rows = merge(&[(Queue::NeedsReview, nr), (Queue::Rtbc, rtbc)]);

        let names: Vec<_> = rows.iter().map(|r| r.component.as_str()).collect();
        assert_eq!(names, ["views", "ajax system", "node system"]);

        let ajax = &rows[1];
        assert_eq!(ajax.count(Queue::NeedsReview), 0);
        assert_eq!(ajax.count(Queue::Rtbc), 1);
        assert_eq!(ajax.counts.len(), 2);

        for row in &rows {
            assert_eq!(
                row.total,
                row.count(Queue::NeedsReview) + row.count(Queue::Rtbc)
            );
        }
        assert_eq!(rows[0].total, 3);
    }

    #[test]
    fn sorts_by_total_then_secondary_queue() {
        let nr = counts(&[("a", 3), ("b", 1), ("c", 2), ("d", 5)]);
        let rtbc = counts(&[("a", 0), ("b", 2), ("c", 1)]);
        let rows = merge(&[(Queue::NeedsReview, nr), (Queue::Rtbc, rtbc)]);

        let ranked: Vec<_> = rows
            .iter()
            .map(|r| (r.component.as_str(), r.total, r.count(Queue::Rtbc)))
            .collect();
        assert_eq!(
            ranked,
            [("d", 5, 0), ("b", 3, 2), ("c", 3, 1), ("a", 3, 0)]
        );

        for pair in rows.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn single_queue_ties_fall_back_to_name() {
        let nr = counts(&[("zeta", 2), ("alpha", 2), ("mid", 4)]);
        let rows = merge(&[(Queue::NeedsReview, nr)]);
        let names: Vec<_> = rows.iter().map(|r| r.component.as_str()).collect();
        assert_eq!(names, ["mid", "alpha", "zeta"]);
    }

    #[test]
    fn no_queues_no_rows() {
        assert!(merge(&[]).is_empty());
    }
}
