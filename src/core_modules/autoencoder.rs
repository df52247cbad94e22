// THEORY:
// The autoencoder is a two-layer, purely linear network: `hidden = x · W1`,
// `output = hidden · W2`. With `hidden_size` smaller than the block vector
// length it is a rank-reduction compressor; the hidden vector is the compressed
// form of one channel of one block.
//
// Key principles:
// 1.  **Explicit weights**: the two matrices live in a `Weights` value owned by
//     the `Autoencoder`. Training borrows the autoencoder mutably and nothing
//     else can reach the weights.
// 2.  **Tied, then free**: `W2` starts as the transpose of `W1`. That is only an
//     initialization policy; the matrices drift apart as soon as training starts.
// 3.  **Simultaneous update**: both gradients are computed from one forward pass
//     over the pre-update weights (`gradients`) before either matrix is touched
//     (`apply`). Splitting the two steps also lets batch training compute many
//     gradients in parallel against the same weights.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use rand::distributions::Uniform;

use crate::error::{CompressionError, Result};

/// Half-width of the uniform interval the encode weights are drawn from.
pub const INIT_RANGE: f64 = 0.1;

/// The encode (`block_len × hidden_size`) and decode (`hidden_size × block_len`) matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub encode: Array2<f64>,
    pub decode: Array2<f64>,
}

impl Weights {
    /// Draws `encode` uniformly from `[-INIT_RANGE, INIT_RANGE]` and ties
    /// `decode` to its transpose.
    pub fn random<R: Rng + ?Sized>(block_len: usize, hidden_size: usize, rng: &mut R) -> Self {
        let dist = Uniform::new_inclusive(-INIT_RANGE, INIT_RANGE);
        let encode = Array2::from_shape_fn((block_len, hidden_size), |_| rng.sample(dist));
        Self::tied(encode)
    }

    /// Uses `encode` as is and sets `decode` to its transpose.
    pub fn tied(encode: Array2<f64>) -> Self {
        let decode = encode.t().to_owned();
        Self { encode, decode }
    }

    /// Pairs two matrices, checking that their shapes mirror each other.
    pub fn new(encode: Array2<f64>, decode: Array2<f64>) -> Result<Self> {
        if encode.dim() != (decode.ncols(), decode.nrows()) {
            return Err(CompressionError::ShapeMismatch {
                expected: vec![encode.ncols(), encode.nrows()],
                got: decode.shape().to_vec(),
            });
        }
        Ok(Self { encode, decode })
    }

    pub fn block_len(&self) -> usize {
        self.encode.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.encode.ncols()
    }

    /// Whether every weight is a finite number.
    pub fn is_finite(&self) -> bool {
        self.encode.iter().chain(self.decode.iter()).all(|w| w.is_finite())
    }
}

/// The two activations of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Forward {
    pub hidden: Array1<f64>,
    pub output: Array1<f64>,
}

/// A gradient for each weight matrix, shaped like `Weights`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub encode: Array2<f64>,
    pub decode: Array2<f64>,
}

impl Gradients {
    pub fn zeros(block_len: usize, hidden_size: usize) -> Self {
        Self {
            encode: Array2::zeros((block_len, hidden_size)),
            decode: Array2::zeros((hidden_size, block_len)),
        }
    }

    /// Adds `other` into `self`.
    pub fn accumulate(&mut self, other: &Gradients) {
        self.encode += &other.encode;
        self.decode += &other.decode;
    }

    pub fn scale(&mut self, factor: f64) {
        self.encode *= factor;
        self.decode *= factor;
    }
}

/// A linear two-layer autoencoder over block channel vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Autoencoder {
    weights: Weights,
}

impl Autoencoder {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    /// Builds an autoencoder with freshly initialized, tied weights.
    pub fn random<R: Rng + ?Sized>(block_len: usize, hidden_size: usize, rng: &mut R) -> Self {
        Self::new(Weights::random(block_len, hidden_size, rng))
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn into_weights(self) -> Weights {
        self.weights
    }

    pub fn block_len(&self) -> usize {
        self.weights.block_len()
    }

    pub fn hidden_size(&self) -> usize {
        self.weights.hidden_size()
    }

    /// Encodes then decodes `input`. `input` must have `block_len` elements.
    pub fn forward(&self, input: &Array1<f64>) -> Forward {
        let hidden = input.dot(&self.weights.encode);
        let output = hidden.dot(&self.weights.decode);
        Forward { hidden, output }
    }

    /// Mean squared difference between the reconstruction and `input`.
    pub fn sample_error(&self, input: &Array1<f64>) -> f64 {
        let output = self.forward(input).output;
        (&output - input).mapv(|d| d * d).mean().unwrap_or(0.0)
    }

    /// Gradients of the reconstruction error for one sample, from the current weights.
    ///
    /// `encode` gets `xᵀ · δ · W2ᵀ` and `decode` gets `hiddenᵀ · δ`,
    /// with `δ = output - x`.
    pub fn gradients(&self, input: &Array1<f64>) -> Gradients {
        let Forward { hidden, output } = self.forward(input);
        let delta = &output - input;
        let back = delta.dot(&self.weights.decode.t());
        Gradients {
            encode: outer(input.view(), back.view()),
            decode: outer(hidden.view(), delta.view()),
        }
    }

    /// Steps both matrices against `gradients`.
    pub fn apply(&mut self, gradients: &Gradients, learning_rate: f64) {
        self.weights.encode.scaled_add(-learning_rate, &gradients.encode);
        self.weights.decode.scaled_add(-learning_rate, &gradients.decode);
    }

    /// One online training step on a single sample.
    pub fn update_weights(&mut self, input: &Array1<f64>, learning_rate: f64) {
        let gradients = self.gradients(input);
        self.apply(&gradients, learning_rate);
    }
}

fn outer(column: ArrayView1<'_, f64>, row: ArrayView1<'_, f64>) -> Array2<f64> {
    column.insert_axis(Axis(1)).dot(&row.insert_axis(Axis(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_network() -> Autoencoder {
        Autoencoder::new(Weights::new(arr2(&[[0.5], [0.2]]), arr2(&[[0.4, -0.2]])).unwrap())
    }

    #[test]
    fn random_weights_start_tied_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = Weights::random(12, 5, &mut rng);
        assert_eq!(weights.encode.dim(), (12, 5));
        assert_eq!(weights.decode.dim(), (5, 12));
        assert_eq!(weights.decode, weights.encode.t());
        assert!(weights.encode.iter().all(|w| w.abs() <= INIT_RANGE));
    }

    #[test]
    fn seeded_initialization_is_reproducible() {
        let a = Weights::random(4, 2, &mut StdRng::seed_from_u64(42));
        let b = Weights::random(4, 2, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn mismatched_weight_shapes_are_rejected() {
        let result = Weights::new(Array2::zeros((4, 2)), Array2::zeros((4, 2)));
        assert!(matches!(result, Err(CompressionError::ShapeMismatch { .. })));
    }

    #[test]
    fn identity_weights_reconstruct_exactly() {
        let network = Autoencoder::new(Weights::tied(Array2::eye(3)));
        let input = arr1(&[0.25, -0.5, 1.0]);
        let Forward { hidden, output } = network.forward(&input);
        assert_eq!(hidden, input);
        assert_eq!(output, input);
        assert_abs_diff_eq!(network.sample_error(&input), 0.0);
    }

    #[test]
    fn sample_error_is_mean_of_squares() {
        // output = [0.2, -0.1], delta = [-0.8, -0.1]
        let network = small_network();
        assert_abs_diff_eq!(network.sample_error(&arr1(&[1.0, 0.0])), 0.325, epsilon = 1e-12);
    }

    #[test]
    fn update_uses_pre_update_weights_for_both_matrices() {
        let mut network = small_network();
        network.update_weights(&arr1(&[1.0, 0.0]), 0.1);
        let weights = network.weights();
        // back-propagated error through the old decode matrix is -0.30
        assert_abs_diff_eq!(weights.encode[[0, 0]], 0.53, epsilon = 1e-12);
        assert_abs_diff_eq!(weights.encode[[1, 0]], 0.2, epsilon = 1e-12);
        // hidden from the old encode matrix is 0.5
        assert_abs_diff_eq!(weights.decode[[0, 0]], 0.44, epsilon = 1e-12);
        assert_abs_diff_eq!(weights.decode[[0, 1]], -0.195, epsilon = 1e-12);
    }

    #[test]
    fn weights_drift_from_tied_after_training() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut network = Autoencoder::random(4, 2, &mut rng);
        network.update_weights(&arr1(&[0.9, -0.3, 0.1, 0.5]), 0.05);
        assert_ne!(network.weights().decode, network.weights().encode.t());
    }

    #[test]
    fn repeated_updates_reduce_error() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut network = Autoencoder::random(4, 4, &mut rng);
        let input = arr1(&[0.6, -0.2, 0.4, -0.8]);
        let before = network.sample_error(&input);
        for _ in 0..500 {
            network.update_weights(&input, 0.05);
        }
        let after = network.sample_error(&input);
        assert!(after < before * 0.01, "error went from {before} to {after}");
    }

    #[test]
    fn summed_step_matches_two_online_steps_at_small_rates() {
        let learning_rate = 1e-3;
        let a = arr1(&[1.0, 0.0]);
        let b = arr1(&[0.0, -1.0]);

        let mut batched = small_network();
        let mut total = Gradients::zeros(2, 1);
        total.accumulate(&batched.gradients(&a));
        total.accumulate(&batched.gradients(&b));
        batched.apply(&total, learning_rate);

        let mut online = small_network();
        online.update_weights(&a, learning_rate);
        online.update_weights(&b, learning_rate);

        let (batched, online) = (batched.weights(), online.weights());
        for (x, y) in batched.encode.iter().zip(online.encode.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-5);
        }
        for (x, y) in batched.decode.iter().zip(online.decode.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-5);
        }
        assert_ne!(batched, small_network().weights());
    }

    #[test]
    fn non_finite_weights_are_detected() {
        let mut weights = Weights::tied(Array2::eye(2));
        assert!(weights.is_finite());
        weights.encode[[0, 1]] = f64::NAN;
        assert!(!weights.is_finite());
    }
}
