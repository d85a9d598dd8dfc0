use kinetrack_core::Sparsity;

/// Greedily colors Jacobian columns so no two columns of one color share a row.
///
/// Columns of the same color are structurally orthogonal, so seeding all of
/// them at once in a single forward-mode pass recovers each of their entries
/// without mixing. Returns one color per column; colors are dense from zero.
pub(super) fn color_columns(sparsity: &Sparsity) -> Vec<usize> {
    let n = sparsity.num_columns();

    let mut column_rows = vec![Vec::new(); n];
    for (row, col) in sparsity.entries() {
        column_rows[col].push(row);
    }

    let mut colors = vec![usize::MAX; n];
    // stamp[k] == col marks color k as taken by a neighbor of col.
    let mut stamp: Vec<usize> = Vec::new();

    for col in 0..n {
        for &row in &column_rows[col] {
            for &neighbor in sparsity.row(row) {
                let color = colors[neighbor];
                if color == usize::MAX {
                    continue;
                }
                if color >= stamp.len() {
                    stamp.resize(color + 1, usize::MAX);
                }
                stamp[color] = col;
            }
        }

        let free = stamp
            .iter()
            .position(|&owner| owner != col)
            .unwrap_or(stamp.len());
        if free == stamp.len() {
            stamp.push(usize::MAX);
        }
        colors[col] = free;
    }

    colors
}

/// Returns the number of distinct colors in a coloring.
pub(super) fn num_colors(colors: &[usize]) -> usize {
    colors.iter().max().map_or(0, |&max| max + 1)
}
