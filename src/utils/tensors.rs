use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};
use serde::{Deserialize, Serialize};

/// A row-major `[rows, cols]` integer tensor kept in plain memory so it can be cached
///
/// Deserialization rejects a `data` buffer that does not hold exactly `rows * cols` values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIntMatrix")]
pub struct IntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

#[derive(Deserialize)]
struct RawIntMatrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl TryFrom<RawIntMatrix> for IntMatrix {
    type Error = String;

    fn try_from(raw: RawIntMatrix) -> Result<Self, Self::Error> {
        let expected = raw
            .rows
            .checked_mul(raw.cols)
            .ok_or_else(|| format!("a {}x{} matrix is too large", raw.rows, raw.cols))?;

        if raw.data.len() != expected {
            return Err(format!(
                "a {}x{} matrix needs {expected} values, found {}",
                raw.rows,
                raw.cols,
                raw.data.len()
            ));
        }

        Ok(Self {
            rows: raw.rows,
            cols: raw.cols,
            data: raw.data,
        })
    }
}

impl IntMatrix {
    /// Stack equal-length rows into a matrix `cols` wide
    pub fn from_rows(cols: usize, rows: Vec<Vec<i64>>) -> Self {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);

        for row in rows {
            debug_assert_eq!(row.len(), cols, "every row must already be {cols} wide");
            data.extend(fit(&row, cols, 0));
        }

        Self {
            rows: n_rows,
            cols,
            data,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width of every row
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The `[rows, cols]` shape
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Borrow a single row
    pub fn row(&self, index: usize) -> Option<&[i64]> {
        if index >= self.rows {
            return None;
        }

        let start = index * self.cols;

        self.data.get(start..start + self.cols)
    }
}

/// Pad with `pad` or truncate so the result is exactly `len` long
pub fn fit<T: Copy>(values: &[T], len: usize, pad: T) -> Vec<T> {
    let mut fitted: Vec<T> = values.iter().take(len).copied().collect();
    fitted.resize(len, pad);
    fitted
}

/// Widen token-level `u32` values to the `i64` used for integer tensors
pub fn widen(values: &[u32]) -> Vec<i64> {
    values.iter().map(|v| *v as i64).collect()
}

/// Stack fixed-length rows into a `[batch_size, seq_length]` tensor, padding short rows with
/// `pad_token`
pub fn stack_rows<B: Backend>(
    pad_token: i64,
    rows: Vec<Vec<i64>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();

    let values: Vec<B::IntElem> = rows
        .iter()
        .flat_map(|row| fit(row, seq_length, pad_token))
        .map(|v| v.elem())
        .collect();

    let data: Data<B::IntElem, 2> = Data::new(values, Shape::new([batch_size, seq_length]));

    Tensor::from_data(data, device)
}

/// A 1D tensor of per-row scalars, such as class ids or answer positions
pub fn column<B: Backend>(values: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let len = values.len();
    let values: Vec<B::IntElem> = values.into_iter().map(|v| v.elem()).collect();
    let data: Data<B::IntElem, 1> = Data::new(values, Shape::new([len]));

    Tensor::from_data(data, device)
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit(&[1, 2, 3], 5, 0), vec![1, 2, 3, 0, 0]);
        assert_eq!(fit(&[1, 2, 3], 2, 0), vec![1, 2]);
        assert_eq!(fit::<i64>(&[], 0, 0), Vec::<i64>::new());
    }

    #[test]
    fn matrix_rows_are_addressable() {
        let matrix = IntMatrix::from_rows(3, vec![vec![1, 2, 3], vec![4, 5, 6]]);

        assert_eq!(matrix.shape(), [2, 3]);
        assert_eq!(matrix.row(1), Some(&[4, 5, 6][..]));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let matrix = IntMatrix::from_rows(384, vec![]);

        assert_eq!(matrix.rows(), 0);
        assert_eq!(matrix.row(0), None);
    }

    #[test]
    fn deserializing_checks_the_shape() {
        let matrix: IntMatrix =
            serde_json::from_str(r#"{"rows":2,"cols":2,"data":[1,2,3,4]}"#).unwrap();
        assert_eq!(matrix.row(1), Some(&[3, 4][..]));

        let short = serde_json::from_str::<IntMatrix>(r#"{"rows":2,"cols":3,"data":[1,2,3]}"#);
        assert!(short.unwrap_err().to_string().contains("needs 6 values, found 3"));

        let huge = serde_json::from_str::<IntMatrix>(&format!(
            r#"{{"rows":{},"cols":2,"data":[]}}"#,
            usize::MAX
        ));
        assert!(huge.is_err());
    }

    #[test]
    fn stacks_rows_into_a_padded_tensor() {
        let device = Default::default();
        let tensor = stack_rows::<NdArray>(9, vec![vec![1, 2], vec![3, 4, 5]], 3, &device);

        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(
            tensor.into_data().convert::<i64>().value,
            vec![1, 2, 9, 3, 4, 5]
        );
    }
}
