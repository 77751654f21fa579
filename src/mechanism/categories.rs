//! Seat-to-category assignment and the category distance tables.

use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Default number of seats (seat 0 is the reject sentinel on top of these).
pub const DEFAULT_N_SEATS: usize = 78;
/// Default number of categories.
pub const DEFAULT_N_CATS: usize = 6;
/// Default inclusive upper seat edge of each category.
pub const DEFAULT_EDGES: [usize; DEFAULT_N_CATS] = [5, 40, 50, 65, 72, 78];

/// Assignment of each of `n_seats + 1` ordinal positions to a category,
/// plus the derived distance tables.
///
/// Built once and shared by reference between the penalty composer and the
/// evaluator.
///
/// # Examples
///
/// ```
/// use rrtune::mechanism::CategoryTable;
///
/// let table = CategoryTable::default_seats();
/// assert_eq!(table.category_of(0), 0);
/// assert_eq!(table.category_of(6), 1);
/// assert_eq!(table.category_of(78), 5);
/// ```
#[derive(Clone, Debug)]
pub struct CategoryTable {
    n_seats: usize,
    n_cats: usize,
    categories: Vec<usize>,
    one_hot: DMatrix<f64>,
    distances: DMatrix<f64>,
    distance_matrix: DMatrix<f64>,
}

impl CategoryTable {
    /// Builds the table for `n_seats` seats split into `n_cats` categories.
    ///
    /// The category pointer starts at 0 and advances by one each time the
    /// seat index exceeds the current edge. Seats beyond the last edge stay
    /// in the last category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCategoryEdges`] if `n_cats` is zero, the
    /// number of edges differs from `n_cats`, or the edges are not strictly
    /// ascending.
    pub fn new(n_seats: usize, n_cats: usize, edges: &[usize]) -> Result<Self> {
        if n_cats == 0 {
            return Err(Error::InvalidCategoryEdges(
                "at least one category is required".to_owned(),
            ));
        }
        if edges.len() != n_cats {
            return Err(Error::InvalidCategoryEdges(format!(
                "expected {n_cats} edges, got {}",
                edges.len()
            )));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidCategoryEdges(format!(
                "edges must be strictly ascending: {edges:?}"
            )));
        }

        Ok(Self::from_categories(
            n_seats,
            n_cats,
            assign_categories(n_seats + 1, edges),
        ))
    }

    /// The 78-seat, 6-category table with edges `[5, 40, 50, 65, 72, 78]`.
    #[must_use]
    pub fn default_seats() -> Self {
        Self::from_categories(
            DEFAULT_N_SEATS,
            DEFAULT_N_CATS,
            assign_categories(DEFAULT_N_SEATS + 1, &DEFAULT_EDGES),
        )
    }

    fn from_categories(n_seats: usize, n_cats: usize, categories: Vec<usize>) -> Self {
        let n_rows = n_seats + 1;
        let one_hot = DMatrix::from_fn(n_rows, n_cats, |i, c| {
            if categories[i] == c { 1.0 } else { 0.0 }
        });
        #[allow(clippy::cast_precision_loss)]
        let distances = DMatrix::from_fn(n_cats, n_cats, |a, b| a.abs_diff(b) as f64);
        let distance_matrix = &one_hot * &distances;
        Self {
            n_seats,
            n_cats,
            categories,
            one_hot,
            distances,
            distance_matrix,
        }
    }

    /// Category index of `seat`.
    ///
    /// # Panics
    ///
    /// Panics if `seat > n_seats`.
    #[must_use]
    pub fn category_of(&self, seat: usize) -> usize {
        self.categories[seat]
    }

    /// Category index of every position, seat 0 first.
    #[must_use]
    pub fn categories(&self) -> &[usize] {
        &self.categories
    }

    /// One-hot assignment, `(n_seats + 1) × n_cats`.
    #[must_use]
    pub fn one_hot(&self) -> &DMatrix<f64> {
        &self.one_hot
    }

    /// `|a - b|` over category indices, `n_cats × n_cats`.
    #[must_use]
    pub fn distances(&self) -> &DMatrix<f64> {
        &self.distances
    }

    /// Per-seat distance to every category, `(n_seats + 1) × n_cats`.
    #[must_use]
    pub fn distance_matrix(&self) -> &DMatrix<f64> {
        &self.distance_matrix
    }

    /// For each seat, the first category at maximal distance from its own.
    #[must_use]
    pub fn furthest_categories(&self) -> Vec<usize> {
        self.distance_matrix
            .row_iter()
            .map(|row| {
                let mut best = 0;
                for (c, &d) in row.iter().enumerate() {
                    if d > row[best] {
                        best = c;
                    }
                }
                best
            })
            .collect()
    }

    /// Number of rows in every per-seat table (`n_seats + 1`).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_seats + 1
    }

    /// Number of seats, not counting the sentinel.
    #[must_use]
    pub fn n_seats(&self) -> usize {
        self.n_seats
    }

    /// Number of categories.
    #[must_use]
    pub fn n_cats(&self) -> usize {
        self.n_cats
    }
}

/// Walks the positions, advancing the category pointer past each edge.
fn assign_categories(n_rows: usize, edges: &[usize]) -> Vec<usize> {
    let mut categories = Vec::with_capacity(n_rows);
    let mut j = 0;
    for i in 0..n_rows {
        if i > edges[j] && j + 1 < edges.len() {
            j += 1;
        }
        categories.push(j);
    }
    categories
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::default_seats()
    }
}
