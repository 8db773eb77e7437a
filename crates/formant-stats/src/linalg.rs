//! Small dense linear algebra on `ndarray` matrices

use crate::StatsError;
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// Maximum number of Jacobi sweeps
const MAX_SWEEPS: usize = 100;

/// Eigen decomposition of a symmetric matrix
#[derive(Debug, Clone)]
pub struct Eigen {
    /// Eigenvalues, descending
    pub values: Array1<f64>,
    /// Eigenvectors, one per column, matching `values`
    pub vectors: Array2<f64>,
}

/// Column means of an observations-by-variables matrix
pub fn column_means(data: &Array2<f64>) -> Result<Array1<f64>, StatsError> {
    data.mean_axis(Axis(0)).ok_or(StatsError::Empty)
}

/// Sample covariance matrix (n - 1 denominator) of an
/// observations-by-variables matrix
pub fn covariance_matrix(data: &Array2<f64>) -> Result<Array2<f64>, StatsError> {
    let n = data.nrows();
    if n < 2 {
        return Err(StatsError::TooFewObservations { needed: 2, got: n });
    }
    let means = column_means(data)?;
    let centred = data - &means;
    Ok(centred.t().dot(&centred) / (n as f64 - 1.0))
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotation.
///
/// Each eigenvector is signed so its largest-magnitude component is positive.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<Eigen, StatsError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(StatsError::NotSquare {
            rows: n,
            cols: matrix.ncols(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite);
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);
    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    let mut sweeps = 0;
    while sweeps < MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off <= 1e-24 * scale {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
        sweeps += 1;
    }
    debug!("Jacobi eigen decomposition of {}x{} took {} sweeps", n, n, sweeps);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut vectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        let mut column = v.column(src).to_owned();
        let pivot = column
            .iter()
            .cloned()
            .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
        if pivot < 0.0 {
            column.mapv_inplace(|x| -x);
        }
        vectors.column_mut(dst).assign(&column);
    }

    Ok(Eigen { values, vectors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_covariance() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let cov = covariance_matrix(&data).unwrap();
        assert_close(cov[[0, 0]], 1.0);
        assert_close(cov[[0, 1]], 2.0);
        assert_close(cov[[1, 1]], 4.0);
    }

    #[test]
    fn test_covariance_needs_two_rows() {
        let data = array![[1.0, 2.0]];
        assert!(matches!(
            covariance_matrix(&data),
            Err(StatsError::TooFewObservations { .. })
        ));
    }

    #[test]
    fn test_eigen_diagonal() {
        let m = array![[1.0, 0.0], [0.0, 3.0]];
        let eigen = symmetric_eigen(&m).unwrap();
        assert_close(eigen.values[0], 3.0);
        assert_close(eigen.values[1], 1.0);
        assert_close(eigen.vectors[[1, 0]], 1.0);
    }

    #[test]
    fn test_eigen_reconstructs_matrix() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let eigen = symmetric_eigen(&m).unwrap();
        let lambda = Array2::from_diag(&eigen.values);
        let rebuilt = eigen.vectors.dot(&lambda).dot(&eigen.vectors.t());
        for (x, y) in rebuilt.iter().zip(m.iter()) {
            assert_close(*x, *y);
        }
        assert!(eigen.values[0] >= eigen.values[1] && eigen.values[1] >= eigen.values[2]);
    }

    #[test]
    fn test_eigen_sign_convention() {
        let m = array![[2.0, -1.0], [-1.0, 2.0]];
        let eigen = symmetric_eigen(&m).unwrap();
        for j in 0..2 {
            let column = eigen.vectors.column(j);
            let pivot = column
                .iter()
                .cloned()
                .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn test_eigen_rejects_non_square() {
        let m = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            symmetric_eigen(&m),
            Err(StatsError::NotSquare { .. })
        ));
    }
}
