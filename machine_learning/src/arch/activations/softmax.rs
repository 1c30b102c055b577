use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Row-wise softmax, shifted by each row's maximum so large logits don't overflow.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = logits.to_owned();

    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    probs
}

/// `ln(sum(exp(row)))`, computed without overflowing.
pub fn log_sum_exp(row: ArrayView1<f32>) -> f32 {
    let max = row.fold(f32::NEG_INFINITY, |m, &z| m.max(z));
    max + row.iter().map(|&z| (z - max).exp()).sum::<f32>().ln()
}

/// Index of the largest value of each row, the first one on ties.
pub fn argmax(values: ArrayView2<f32>) -> Vec<usize> {
    values
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
                    if v > max { (i, v) } else { (best, max) }
                })
                .0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rows_sum_to_one() {
        let probs = softmax(array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]].view());

        for row in probs.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        assert!((probs[[1, 0]] - 1. / 3.).abs() < 1e-6);
        assert!(probs[[0, 2]] > probs[[0, 1]]);
    }

    #[test]
    fn huge_logits_stay_finite() {
        let logits = array![[1000.0, -1000.0]];

        let probs = softmax(logits.view());
        assert!(probs.iter().all(|p| p.is_finite()));
        assert_eq!(probs[[0, 0]], 1.0);

        let lse = log_sum_exp(logits.row(0));
        assert!((lse - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn argmax_picks_the_first_maximum() {
        let values = array![[0.2, 0.8], [0.5, 0.5], [0.9, 0.1]];
        assert_eq!(argmax(values.view()), vec![1, 0, 0]);
    }
}
