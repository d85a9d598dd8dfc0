/// Structural sparsity of a constraint Jacobian.
///
/// Row `r` lists the variable indices constraint `r` may depend on. Listing a
/// variable that turns out not to matter is harmless; omitting one that does
/// produces wrong derivatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sparsity {
    num_columns: usize,
    rows: Vec<Vec<usize>>,
}

impl Sparsity {
    /// Creates a sparsity pattern from per-row column lists.
    ///
    /// Each row is sorted and deduplicated.
    ///
    /// # Panics
    ///
    /// Panics if any column index is `>= num_columns`.
    #[must_use]
    pub fn new(num_columns: usize, mut rows: Vec<Vec<usize>>) -> Self {
        for row in &mut rows {
            row.sort_unstable();
            row.dedup();
            assert!(
                row.last().is_none_or(|&last| last < num_columns),
                "column index out of range"
            );
        }
        Self { num_columns, rows }
    }

    /// Creates a pattern where every row depends on every column.
    #[must_use]
    pub fn dense(num_rows: usize, num_columns: usize) -> Self {
        let row: Vec<usize> = (0..num_columns).collect();
        Self {
            num_columns,
            rows: vec![row; num_rows],
        }
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the columns row `row` depends on, in ascending order.
    #[must_use]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    /// Returns the number of structural nonzeros.
    #[must_use]
    pub fn nonzeros(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Iterates over `(row, column)` pairs of structural nonzeros.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, cols)| cols.iter().map(move |&c| (r, c)))
    }
}
