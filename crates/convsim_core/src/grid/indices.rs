//! Row-major index arithmetic over an N-dimensional shape.

/// Compute strides for row-major order (last dimension varies fastest)
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len() - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Convert multi-dimensional indices to a flat index
pub fn flat_index(shape: &[usize], indices: &[usize]) -> Option<usize> {
    if indices.len() != shape.len() {
        return None;
    }
    let strides = compute_strides(shape);
    let mut flat = 0;
    for ((&idx, &size), stride) in indices.iter().zip(shape).zip(strides) {
        if idx >= size {
            return None;
        }
        flat += idx * stride;
    }
    Some(flat)
}

/// Convert a flat index back to multi-dimensional indices
pub fn multi_index(shape: &[usize], flat: usize) -> Option<Vec<usize>> {
    let total: usize = shape.iter().product();
    if shape.is_empty() || flat >= total {
        return None;
    }
    let mut indices = Vec::with_capacity(shape.len());
    let mut remaining = flat;
    for stride in compute_strides(shape) {
        indices.push(remaining / stride);
        remaining %= stride;
    }
    Some(indices)
}

/// Iterator over all indices of a shape in row-major order
pub struct GridIndices {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl GridIndices {
    pub fn new(shape: Vec<usize>) -> Self {
        let done = shape.is_empty() || shape.contains(&0);
        Self {
            current: vec![0; shape.len()],
            shape,
            done,
        }
    }
}

impl Iterator for GridIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current.clone();

        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            self.current[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_row_major() {
        assert_eq!(compute_strides(&[4, 3, 2]), vec![6, 2, 1]);
        assert!(compute_strides(&[]).is_empty());
    }

    #[test]
    fn indices_visit_last_dimension_first() {
        let all: Vec<_> = GridIndices::new(vec![2, 2]).collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn flat_and_multi_index_agree_with_iteration_order() {
        let shape = vec![3, 1, 4];
        for (flat, indices) in GridIndices::new(shape.clone()).enumerate() {
            assert_eq!(flat_index(&shape, &indices), Some(flat));
            assert_eq!(multi_index(&shape, flat), Some(indices));
        }
        assert_eq!(multi_index(&shape, 12), None);
        assert_eq!(flat_index(&shape, &[3, 0, 0]), None);
    }

    #[test]
    fn empty_dimension_yields_nothing() {
        assert_eq!(GridIndices::new(vec![3, 0]).count(), 0);
    }
}
