use super::{check_lengths, feature_width, Features, ModelError, Regressor};

/// Relative pivot size below which the system is treated as singular
const PIVOT_EPSILON: f64 = 1e-12;

/// Ordinary least squares with an intercept.
///
/// Features and targets are centered before solving the normal equations,
/// which keeps large raw values such as epoch seconds well conditioned.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    is_trained: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: &Features, targets: &[f64]) -> Result<(), ModelError> {
        let width = feature_width(features)?;
        check_lengths(features.len(), targets.len())?;
        let n = features.len() as f64;

        let mut x_mean = vec![0.0; width];
        for row in features {
            for (mean, value) in x_mean.iter_mut().zip(row) {
                *mean += value / n;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / n;

        // Normal equations on centered data: (Xc'Xc) b = Xc'yc
        let mut xtx = vec![vec![0.0; width]; width];
        let mut xty = vec![0.0; width];
        for (row, target) in features.iter().zip(targets) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let y = target - y_mean;
            for i in 0..width {
                xty[i] += centered[i] * y;
                for j in 0..width {
                    xtx[i][j] += centered[i] * centered[j];
                }
            }
        }

        let coefficients = solve(xtx, xty)?;
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|b| !b.is_finite()) {
            return Err(ModelError::Singular);
        }

        self.coefficients = coefficients;
        self.intercept = intercept;
        self.is_trained = true;
        Ok(())
    }

    fn predict(&self, features: &Features) -> Result<Vec<f64>, ModelError> {
        if !self.is_trained {
            return Err(ModelError::NotFitted);
        }
        features
            .iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(ModelError::DimensionMismatch {
                        expected: self.coefficients.len(),
                        actual: row.len(),
                    });
                }
                Ok(self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, b)| x * b)
                        .sum::<f64>())
            })
            .collect()
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ModelError> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(ModelError::Singular);
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= PIVOT_EPSILON * scale {
            return Err(ModelError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_line() {
        let features: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..5).map(|i| 3.0 + 2.0 * i as f64).collect();

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        assert!((model.intercept() - 3.0).abs() < 1e-9);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-9);
        let predicted = model.predict(&[vec![10.0]]).unwrap();
        assert!((predicted[0] - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_epoch_values_stay_accurate() {
        let day = 86_400.0;
        let base = 1_577_836_800.0; // 2020-01-01
        let features: Vec<Vec<f64>> = (0..4).map(|i| vec![base + i as f64 * 365.0 * day]).collect();
        let targets = vec![10.0, 9.0, 8.0, 7.0];

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        let predicted = model.predict(&[vec![base + 6.0 * 365.0 * day]]).unwrap();
        assert!((predicted[0] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_feature_is_singular() {
        let features = vec![vec![1.0], vec![1.0], vec![1.0]];
        let targets = vec![1.0, 2.0, 3.0];
        let mut model = LinearRegression::new();
        assert_eq!(model.fit(&features, &targets), Err(ModelError::Singular));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegression::new();
        assert_eq!(model.predict(&[vec![1.0]]), Err(ModelError::NotFitted));
    }

    #[test]
    fn test_empty_training_set() {
        let mut model = LinearRegression::new();
        assert_eq!(model.fit(&[], &[]), Err(ModelError::EmptyTrainingSet));
    }
}
