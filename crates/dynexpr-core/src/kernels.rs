//! Per-sample loops shared by the evaluator and the differentiation engines.
//!
//! Every kernel applies a closure independently to each sample (and, for
//! gradients, to that sample's column of the gradient buffer). Closures only
//! see the lanes of their own sample, so the loops carry no cross-iteration
//! dependency and give identical results sequentially or on the rayon pool.
//!
//! Gradient buffers are column-major `rows x samples` matrices: the column of
//! sample `j` is the contiguous slice `data[j * rows..(j + 1) * rows]`.

use crate::core::{config::EvalConfig, types::Scalar};
use rayon::prelude::*;

fn parallel(config: &EvalConfig, nsamples: usize) -> bool {
    let parallel = config.should_parallelize(nsamples);
    log::trace!(
        "sample loop over {nsamples} samples: {}",
        if parallel { "parallel" } else { "sequential" }
    );
    parallel
}

fn for_each_lane<T, F>(config: &EvalConfig, values: &mut [T], f: F)
where
    T: Scalar,
    F: Fn(&mut T) + Sync + Send,
{
    if parallel(config, values.len()) {
        values
            .par_iter_mut()
            .with_min_len(config.min_len())
            .for_each(f);
    } else {
        values.iter_mut().for_each(f);
    }
}

fn for_each_lane_pair<T, F>(config: &EvalConfig, left: &mut [T], right: &[T], f: F)
where
    T: Scalar,
    F: Fn(&mut T, T) + Sync + Send,
{
    if parallel(config, left.len()) {
        left.par_iter_mut()
            .zip(right.par_iter())
            .with_min_len(config.min_len())
            .for_each(|(l, r)| f(l, *r));
    } else {
        left.iter_mut()
            .zip(right.iter())
            .for_each(|(l, r)| f(l, *r));
    }
}

/// `values[j] = f(values[j])`
pub fn map_in_place<T, F>(config: &EvalConfig, values: &mut [T], f: F)
where
    T: Scalar,
    F: Fn(T) -> T + Sync + Send,
{
    for_each_lane(config, values, |x| *x = f(*x));
}

/// `left[j] = g(left[j], right[j])`
pub fn zip_map_in_place<T, F>(config: &EvalConfig, left: &mut [T], right: &[T], g: F)
where
    T: Scalar,
    F: Fn(T, T) -> T + Sync + Send,
{
    for_each_lane_pair(config, left, right, |l, r| *l = g(*l, r));
}

/// Calls `f(&mut values[j], &mut tangent[j])` for every sample.
pub fn unary_tangent<T, F>(config: &EvalConfig, values: &mut [T], tangent: &mut [T], f: F)
where
    T: Scalar,
    F: Fn(&mut T, &mut T) + Sync + Send,
{
    if parallel(config, values.len()) {
        values
            .par_iter_mut()
            .zip(tangent.par_iter_mut())
            .with_min_len(config.min_len())
            .for_each(|(x, dx)| f(x, dx));
    } else {
        values
            .iter_mut()
            .zip(tangent.iter_mut())
            .for_each(|(x, dx)| f(x, dx));
    }
}

/// Calls `f(&mut left[j], &mut dleft[j], right[j], dright[j])` for every sample.
pub fn binary_tangent<T, F>(
    config: &EvalConfig,
    left: &mut [T],
    left_tangent: &mut [T],
    right: &[T],
    right_tangent: &[T],
    f: F,
) where
    T: Scalar,
    F: Fn(&mut T, &mut T, T, T) + Sync + Send,
{
    if parallel(config, left.len()) {
        left.par_iter_mut()
            .zip(left_tangent.par_iter_mut())
            .zip(right.par_iter().zip(right_tangent.par_iter()))
            .with_min_len(config.min_len())
            .for_each(|((l, dl), (r, dr))| f(l, dl, *r, *dr));
    } else {
        left.iter_mut()
            .zip(left_tangent.iter_mut())
            .zip(right.iter().zip(right_tangent.iter()))
            .for_each(|((l, dl), (r, dr))| f(l, dl, *r, *dr));
    }
}

/// Calls `f(&mut values[j], gradient_column_j)` for every sample.
pub fn unary_gradient<T, F>(
    config: &EvalConfig,
    values: &mut [T],
    gradient: &mut [T],
    rows: usize,
    f: F,
) where
    T: Scalar,
    F: Fn(&mut T, &mut [T]) + Sync + Send,
{
    if rows == 0 {
        return for_each_lane(config, values, |x| f(x, &mut []));
    }
    if parallel(config, values.len()) {
        values
            .par_iter_mut()
            .zip(gradient.par_chunks_mut(rows))
            .with_min_len(config.min_len())
            .for_each(|(x, column)| f(x, column));
    } else {
        values
            .iter_mut()
            .zip(gradient.chunks_mut(rows))
            .for_each(|(x, column)| f(x, column));
    }
}

/// Calls `f(&mut left[j], left_column_j, right[j], right_column_j)` for every sample.
pub fn binary_gradient<T, F>(
    config: &EvalConfig,
    left: &mut [T],
    left_gradient: &mut [T],
    right: &[T],
    right_gradient: &[T],
    rows: usize,
    f: F,
) where
    T: Scalar,
    F: Fn(&mut T, &mut [T], T, &[T]) + Sync + Send,
{
    if rows == 0 {
        return for_each_lane_pair(config, left, right, |l, r| f(l, &mut [], r, &[]));
    }
    if parallel(config, left.len()) {
        left.par_iter_mut()
            .zip(left_gradient.par_chunks_mut(rows))
            .zip(right.par_iter().zip(right_gradient.par_chunks(rows)))
            .with_min_len(config.min_len())
            .for_each(|((l, dl), (r, dr))| f(l, dl, *r, dr));
    } else {
        left.iter_mut()
            .zip(left_gradient.chunks_mut(rows))
            .zip(right.iter().zip(right_gradient.chunks(rows)))
            .for_each(|((l, dl), (r, dr))| f(l, dl, *r, dr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> [EvalConfig; 2] {
        [
            EvalConfig::sequential(),
            EvalConfig::new()
                .with_min_samples_for_parallel(1)
                .with_chunk_size(2),
        ]
    }

    #[test]
    fn test_map_kernels() {
        for config in configs() {
            let mut values = vec![1.0_f64, 2.0, 3.0, 4.0, 5.0];
            map_in_place(&config, &mut values, |x| x * x);
            assert_eq!(values, vec![1.0, 4.0, 9.0, 16.0, 25.0]);

            zip_map_in_place(&config, &mut values, &[1.0, 1.0, 1.0, 1.0, 1.0], |l, r| l - r);
            assert_eq!(values, vec![0.0, 3.0, 8.0, 15.0, 24.0]);
        }
    }

    #[test]
    fn test_tangent_kernels() {
        for config in configs() {
            let mut x = vec![1.0_f64, 2.0, 3.0];
            let mut dx = vec![1.0_f64, 1.0, 0.0];
            unary_tangent(&config, &mut x, &mut dx, |x, dx| {
                *dx *= 2.0 * *x;
                *x *= *x;
            });
            assert_eq!(x, vec![1.0, 4.0, 9.0]);
            assert_eq!(dx, vec![2.0, 4.0, 0.0]);

            let (r, dr) = ([1.0, 2.0, 3.0], [0.5, 0.5, 0.5]);
            binary_tangent(&config, &mut x, &mut dx, &r, &dr, |l, dl, r, dr| {
                *dl = r * *dl + *l * dr;
                *l *= r;
            });
            assert_eq!(x, vec![1.0, 8.0, 27.0]);
            assert_eq!(dx, vec![2.5, 10.0, 4.5]);
        }
    }

    #[test]
    fn test_gradient_kernels_touch_own_column() {
        for config in configs() {
            // 2 rows x 3 samples, column-major
            let mut values = vec![1.0_f64, 2.0, 3.0];
            let mut gradient = vec![1.0_f64, 0.0, 1.0, 0.0, 1.0, 0.0];
            unary_gradient(&config, &mut values, &mut gradient, 2, |x, column| {
                let scale = *x;
                column.iter_mut().for_each(|g| *g *= scale);
                *x += 1.0;
            });
            assert_eq!(values, vec![2.0, 3.0, 4.0]);
            assert_eq!(gradient, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);

            let right_gradient = vec![0.0_f64, 1.0, 0.0, 1.0, 0.0, 1.0];
            binary_gradient(
                &config,
                &mut values,
                &mut gradient,
                &[1.0, 1.0, 1.0],
                &right_gradient,
                2,
                |l, dl, r, dr| {
                    dl.iter_mut().zip(dr).for_each(|(a, b)| *a += *b);
                    *l += r;
                },
            );
            assert_eq!(values, vec![3.0, 4.0, 5.0]);
            assert_eq!(gradient, vec![1.0, 1.0, 2.0, 1.0, 3.0, 1.0]);
        }
    }

    #[test]
    fn test_gradient_kernels_without_rows() {
        for config in configs() {
            let mut values = vec![1.0_f64, 2.0];
            unary_gradient(&config, &mut values, &mut [], 0, |x, column| {
                assert!(column.is_empty());
                *x = -*x;
            });
            binary_gradient(&config, &mut values, &mut [], &[10.0, 10.0], &[], 0, |l, _, r, _| {
                *l += r;
            });
            assert_eq!(values, vec![9.0, 8.0]);
        }
    }
}
