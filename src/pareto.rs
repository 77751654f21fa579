//! Pareto dominance and non-dominated sorting.
//!
//! The tuner scores every trial on four objectives at once, so there is no
//! single best trial. These helpers rank trials into successive fronts;
//! front 0 (the Pareto front) is what [`Study::best_trials`](crate::Study::best_trials)
//! returns and what the MOTPE sampler treats as "good".
//!
//! # Example
//!
//! ```
//! use rrtune::Direction;
//! use rrtune::pareto::{non_dominated_sort, pareto_front_indices};
//!
//! let solutions = vec![
//!     vec![1.0, 5.0], // Pareto-optimal
//!     vec![5.0, 1.0], // Pareto-optimal
//!     vec![3.0, 3.0], // Pareto-optimal
//!     vec![4.0, 4.0], // Dominated by (3, 3)
//! ];
//! let dirs = [Direction::Minimize, Direction::Minimize];
//!
//! let fronts = non_dominated_sort(&solutions, &dirs);
//! assert_eq!(fronts.len(), 2);
//!
//! let mut front = pareto_front_indices(&solutions, &dirs);
//! front.sort_unstable();
//! assert_eq!(front, vec![0, 1, 2]);
//! ```

use crate::types::Direction;

/// Returns `true` if solution `a` Pareto-dominates solution `b`.
///
/// A solution dominates another if it is at least as good in all objectives
/// and strictly better in at least one, respecting the given directions.
#[must_use]
pub fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), directions.len());

    let mut strictly_better = false;
    for ((&av, &bv), dir) in a.iter().zip(b.iter()).zip(directions.iter()) {
        let (better, worse) = match dir {
            Direction::Minimize => (av < bv, av > bv),
            Direction::Maximize => (av > bv, av < bv),
        };
        if worse {
            return false;
        }
        if better {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fast non-dominated sorting (Deb et al., 2002).
///
/// Returns `fronts` where `fronts[0]` is the Pareto front; each inner vec
/// holds indices into `values`. Complexity: O(M * N^2).
#[must_use]
pub fn non_dominated_sort(values: &[Vec<f64>], directions: &[Direction]) -> Vec<Vec<usize>> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // S_p: solutions dominated by p
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    // n_p: domination count for p
    let mut domination_count: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&values[i], &values[j], directions) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&values[j], &values[i], directions) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current_front.is_empty() {
        let mut next_front: Vec<usize> = Vec::new();
        for &p in &current_front {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        fronts.push(current_front);
        current_front = next_front;
    }

    fronts
}

/// Indices of the non-dominated solutions (front 0).
#[must_use]
pub fn pareto_front_indices(values: &[Vec<f64>], directions: &[Direction]) -> Vec<usize> {
    non_dominated_sort(values, directions)
        .into_iter()
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN2: [Direction; 2] = [Direction::Minimize, Direction::Minimize];

    #[test]
    fn test_dominates_requires_strict_improvement() {
        assert!(dominates(&[1.0, 1.0], &[2.0, 1.0], &MIN2));
        assert!(!dominates(&[1.0, 1.0], &[1.0, 1.0], &MIN2));
        assert!(!dominates(&[1.0, 3.0], &[2.0, 1.0], &MIN2));
    }

    #[test]
    fn test_dominates_respects_maximize() {
        let dirs = [Direction::Maximize, Direction::Minimize];
        assert!(dominates(&[5.0, 1.0], &[4.0, 1.0], &dirs));
        assert!(!dominates(&[4.0, 1.0], &[5.0, 1.0], &dirs));
    }

    #[test]
    fn test_sort_assigns_every_index_once() {
        let values = vec![
            vec![1.0, 4.0],
            vec![2.0, 2.0],
            vec![4.0, 1.0],
            vec![3.0, 3.0],
            vec![5.0, 5.0],
        ];
        let fronts = non_dominated_sort(&values, &MIN2);
        assert_eq!(fronts.len(), 3);
        let mut all: Vec<usize> = fronts.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
        assert_eq!(fronts[2], vec![4]);
    }

    #[test]
    fn test_empty_input() {
        assert!(non_dominated_sort(&[], &MIN2).is_empty());
        assert!(pareto_front_indices(&[], &MIN2).is_empty());
    }

    #[test]
    fn test_four_objectives() {
        let dirs = [Direction::Minimize; 4];
        let values = vec![
            vec![0.0, 1.0, 2.0, 0.5],
            vec![0.1, 1.0, 2.0, 0.5],
            vec![1.0, 0.0, 0.0, 0.0],
        ];
        let mut front = pareto_front_indices(&values, &dirs);
        front.sort_unstable();
        assert_eq!(front, vec![0, 2]);
    }
}
