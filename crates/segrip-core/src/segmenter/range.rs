//! Interval type and worker partitioning.

/// Half-open range of segment indices `[start, end)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// First index (inclusive).
    pub start: usize,
    /// End index (exclusive).
    pub end: usize,
}

impl Interval {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<(usize, usize)> for Interval {
    fn from((start, end): (usize, usize)) -> Self {
        Interval { start, end }
    }
}

/// Splits `total` indices into `workers` contiguous intervals.
///
/// Every interval has `total / workers` indices and the last one also takes
/// the remainder. With `total < workers` all but the last interval are empty.
/// `workers == 0` is treated as 1.
pub fn partition(total: usize, workers: usize) -> Vec<Interval> {
    let workers = workers.max(1);
    let size = total / workers;
    let remainder = total % workers;

    let mut out: Vec<Interval> = (0..workers)
        .map(|i| Interval {
            start: i * size,
            end: (i + 1) * size,
        })
        .collect();
    if let Some(last) = out.last_mut() {
        last.end += remainder;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(p: &[Interval]) -> Vec<(usize, usize)> {
        p.iter().map(|i| (i.start, i.end)).collect()
    }

    fn assert_covers(p: &[Interval], total: usize) {
        let mut next = 0;
        for iv in p {
            if iv.is_empty() {
                continue;
            }
            assert_eq!(iv.start, next, "gap or overlap at {}", iv.start);
            next = iv.end;
        }
        assert_eq!(next, total);
        let sum: usize = p.iter().map(Interval::len).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn remainder_goes_to_last_interval() {
        assert_eq!(pairs(&partition(10, 3)), vec![(0, 3), (3, 6), (6, 10)]);
    }

    #[test]
    fn even_split() {
        assert_eq!(
            pairs(&partition(1000, 4)),
            vec![(0, 250), (250, 500), (500, 750), (750, 1000)]
        );
    }

    #[test]
    fn fewer_indices_than_workers() {
        let p = partition(2, 5);
        assert_eq!(p.len(), 5);
        assert!(p[..4].iter().all(Interval::is_empty));
        assert_eq!((p[4].start, p[4].end), (0, 2));
        assert_covers(&p, 2);
    }

    #[test]
    fn zero_total() {
        let p = partition(0, 3);
        assert_eq!(p.len(), 3);
        assert!(p.iter().all(Interval::is_empty));
        assert_covers(&p, 0);
    }

    #[test]
    fn zero_workers_treated_as_one() {
        assert_eq!(pairs(&partition(7, 0)), vec![(0, 7)]);
    }

    #[test]
    fn union_is_exact_for_many_shapes() {
        for total in 0..60 {
            for workers in 1..12 {
                let p = partition(total, workers);
                assert_eq!(p.len(), workers);
                for w in p.windows(2) {
                    assert!(w[0].start <= w[1].start, "not ascending");
                }
                assert_covers(&p, total);
            }
        }
    }

    #[test]
    fn indices_iterates_half_open() {
        let iv = Interval::from((3, 6));
        assert_eq!(iv.indices().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
