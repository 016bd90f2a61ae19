use crate::errors::RankevalError;
use std::fmt;

/// Contiguous Column Major Matrix data container.
///
/// The values of each feature are stored next to each other, so
/// a whole feature column can be handed out as a slice when instances
/// are routed through a split.
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Indices into the data row-wise.
    pub index: Vec<usize>,
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix, `data` is expected to be in column major order.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix {
            data,
            index: (0..rows).collect(),
            rows,
            cols,
        }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[j * self.rows + i]
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        let start = col * self.rows;
        &self.data[start..start + self.rows]
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<T> {
        self.data.iter().skip(row).step_by(self.rows).copied().collect()
    }
}

impl<'a, T> fmt::Display for Matrix<'a, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut val = String::new();
        for i in 0..self.rows {
            for j in 0..self.cols {
                val.push_str(self.get(i, j).to_string().as_str());
                if j == (self.cols - 1) {
                    val.push('\n');
                } else {
                    val.push(' ');
                }
            }
        }
        write!(f, "{}", val)
    }
}

/// A held-out dataset: the dense feature matrix and the ground truth target.
pub struct Dataset<'a> {
    /// Feature matrix, one row per instance.
    pub x: Matrix<'a, f64>,
    /// Ground truth target, one value per instance.
    pub y: &'a [f64],
}

impl<'a> Dataset<'a> {
    /// Create a dataset, checking that the matrix and the target agree in shape.
    ///
    /// * `data` - Column major feature values, `n_instances * n_features` long.
    /// * `y` - Target values, `n_instances` long.
    /// * `n_instances` - Number of instances (rows).
    /// * `n_features` - Number of features (columns).
    pub fn new(data: &'a [f64], y: &'a [f64], n_instances: usize, n_features: usize) -> Result<Self, RankevalError> {
        Self::from_matrix(Matrix::new(data, n_instances, n_features), y)
    }

    /// Create a dataset from an existing matrix.
    pub fn from_matrix(x: Matrix<'a, f64>, y: &'a [f64]) -> Result<Self, RankevalError> {
        let dataset = Dataset { x, y };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check that the matrix is not empty, holds `rows * cols` values,
    /// and that there is one target per row.
    pub fn validate(&self) -> Result<(), RankevalError> {
        let x = &self.x;
        if x.rows == 0 || x.cols == 0 {
            return Err(RankevalError::EmptyDataset(x.rows, x.cols));
        }
        if x.data.len() != x.rows * x.cols {
            return Err(RankevalError::ShapeMismatch(
                "feature matrix values".to_string(),
                x.rows * x.cols,
                x.data.len(),
            ));
        }
        if self.y.len() != x.rows {
            return Err(RankevalError::ShapeMismatch("target".to_string(), x.rows, self.y.len()));
        }
        Ok(())
    }

    pub fn n_instances(&self) -> usize {
        self.x.rows
    }

    pub fn n_features(&self) -> usize {
        self.x.cols
    }
}
