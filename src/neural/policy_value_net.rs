//! The two evaluator heads: a policy network over board positions and a
//! scalar value network, both single-hidden-layer perceptrons over the
//! 81-float board encoding.

use tch::{nn, Tensor};

use crate::game::{BOARD_SIZE, FEATURE_LEN};

/// Policy head: 81 -> hidden (ReLU) -> 9 (softmax).
///
/// The output is a distribution over board positions. Illegal positions are
/// not masked here; consumers mask and renormalise.
pub struct PolicyNet {
    pub(crate) fc1: nn::Linear,
    pub(crate) head: nn::Linear,
}

impl PolicyNet {
    pub fn new(vs: &nn::VarStore, hidden_size: usize) -> Self {
        let p = vs.root();
        let fc1 = nn::linear(
            &p / "fc1",
            FEATURE_LEN as i64,
            hidden_size as i64,
            Default::default(),
        );
        let head = nn::linear(
            &p / "head",
            hidden_size as i64,
            BOARD_SIZE as i64,
            Default::default(),
        );
        initialize_weights(vs);
        Self { fc1, head }
    }

    /// Forward pass over a `[batch, 81]` input; returns `[batch, 9]` rows
    /// already normalised by softmax.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        x.apply(&self.fc1)
            .relu()
            .apply(&self.head)
            .softmax(-1, tch::Kind::Float)
    }
}

/// Value head: 81 -> hidden (ReLU) -> 1 (sigmoid).
///
/// The output is the win probability for the side to move, in [0, 1].
pub struct ValueNet {
    pub(crate) fc1: nn::Linear,
    pub(crate) head: nn::Linear,
}

impl ValueNet {
    pub fn new(vs: &nn::VarStore, hidden_size: usize) -> Self {
        let p = vs.root();
        let fc1 = nn::linear(
            &p / "fc1",
            FEATURE_LEN as i64,
            hidden_size as i64,
            Default::default(),
        );
        let head = nn::linear(&p / "head", hidden_size as i64, 1, Default::default());
        initialize_weights(vs);
        Self { fc1, head }
    }

    /// Forward pass over a `[batch, 81]` input; returns `[batch, 1]`.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        x.apply(&self.fc1).relu().apply(&self.head).sigmoid()
    }
}

/// Xavier initialization for weight matrices, zeros for biases.
pub fn initialize_weights(vs: &nn::VarStore) {
    for (name, mut param) in vs.variables() {
        let size = param.size();
        if size.len() == 2 {
            let fan_in = size[1] as f64;
            let fan_out = size[0] as f64;
            let bound = (6.0 / (fan_in + fan_out)).sqrt();
            tch::no_grad(|| {
                let _ = param.f_uniform_(-bound, bound);
            });
        } else if size.len() == 1 {
            tch::no_grad(|| {
                let _ = param.f_zero_();
            });
        }
        log::trace!("initialized {} with shape {:?}", name, size);
    }
}
