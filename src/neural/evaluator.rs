//! The two-headed evaluator consumed by MCTS, self-play and NEAT.
//!
//! Wraps the policy and value networks together with their VarStores and
//! Adam optimizers, and exposes the flat weight layout that NEAT treats as an
//! opaque gene vector: layer-1 weights row-major, layer-1 biases, layer-2
//! weights row-major, layer-2 biases, per head.

use std::path::Path;
use tch::nn::OptimizerConfig;
use tch::{nn, Device, Tensor};

use crate::game::{encode, GameState, BOARD_SIZE, FEATURE_LEN};
use crate::neural::model_io::{load_varstore, save_varstore, stored_shape};
use crate::neural::policy_value_net::{PolicyNet, ValueNet};
use crate::training::TrainingExample;
use crate::{Result, RpsError};

/// Configuration for evaluator construction.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct EvaluatorConfig {
    /// Hidden layer width shared by both heads. Kept small (64-256) so that
    /// search cost, not inference cost, dominates runtime on CPU.
    pub hidden_size: usize,
    /// Policy head learning rate.
    pub policy_lr: f64,
    /// Value head learning rate.
    pub value_lr: f64,
    /// Seed for weight initialization.
    pub seed: i64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            hidden_size: 128,
            policy_lr: 1e-3,
            value_lr: 2e-4,
            seed: 42,
        }
    }
}

/// Flat weight count of the policy head for a given hidden width.
pub fn policy_weight_count(hidden_size: usize) -> usize {
    FEATURE_LEN * hidden_size + hidden_size + hidden_size * BOARD_SIZE + BOARD_SIZE
}

/// Flat weight count of the value head for a given hidden width.
pub fn value_weight_count(hidden_size: usize) -> usize {
    FEATURE_LEN * hidden_size + hidden_size + hidden_size + 1
}

/// Policy + value networks with their optimizers.
pub struct Evaluator {
    config: EvaluatorConfig,
    vs_policy: nn::VarStore,
    vs_value: nn::VarStore,
    policy_net: PolicyNet,
    value_net: ValueNet,
    opt_policy: nn::Optimizer,
    opt_value: nn::Optimizer,
}

impl Evaluator {
    /// Builds a freshly initialized evaluator.
    pub fn new(config: &EvaluatorConfig) -> Result<Self> {
        tch::manual_seed(config.seed);

        let vs_policy = nn::VarStore::new(Device::Cpu);
        let vs_value = nn::VarStore::new(Device::Cpu);
        let policy_net = PolicyNet::new(&vs_policy, config.hidden_size);
        let value_net = ValueNet::new(&vs_value, config.hidden_size);

        let opt_policy = nn::Adam::default()
            .build(&vs_policy, config.policy_lr)
            .map_err(|e| RpsError::Model(e.to_string()))?;
        let opt_value = nn::Adam::default()
            .build(&vs_value, config.value_lr)
            .map_err(|e| RpsError::Model(e.to_string()))?;

        Ok(Self {
            config: *config,
            vs_policy,
            vs_value,
            policy_net,
            value_net,
            opt_policy,
            opt_value,
        })
    }

    /// Builds an evaluator directly from flat weight vectors, as NEAT does
    /// when instantiating a genome.
    pub fn from_weights(
        hidden_size: usize,
        policy_weights: &[f32],
        value_weights: &[f32],
    ) -> Result<Self> {
        let config = EvaluatorConfig {
            hidden_size,
            ..Default::default()
        };
        let mut evaluator = Self::new(&config)?;
        evaluator.set_policy_weights(policy_weights)?;
        evaluator.set_value_weights(value_weights)?;
        Ok(evaluator)
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    /// Policy distribution over the nine positions and the win probability
    /// for the side to move.
    pub fn predict(&self, state: &GameState) -> (Vec<f32>, f64) {
        let features = encode(state);
        let input = Tensor::from_slice(&features).view([1, FEATURE_LEN as i64]);
        tch::no_grad(|| {
            let policy = self.policy_net.forward(&input).flatten(0, -1);
            let value = self.value_net.forward(&input);
            let policy: Vec<f32> =
                Vec::try_from(policy).expect("policy output is contiguous f32");
            (policy, value.double_value(&[0, 0]))
        })
    }

    /// Batched prediction, semantically equivalent to per-state `predict`.
    pub fn predict_batch(&self, states: &[GameState]) -> (Vec<Vec<f32>>, Vec<f64>) {
        if states.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let mut features = Vec::with_capacity(states.len() * FEATURE_LEN);
        for state in states {
            features.extend(encode(state));
        }
        let input =
            Tensor::from_slice(&features).view([states.len() as i64, FEATURE_LEN as i64]);
        tch::no_grad(|| {
            let policy = self.policy_net.forward(&input);
            let value = self.value_net.forward(&input).flatten(0, -1);

            let flat: Vec<f32> = Vec::try_from(policy.flatten(0, -1))
                .expect("policy output is contiguous f32");
            let policies = flat.chunks(BOARD_SIZE).map(|c| c.to_vec()).collect();
            let values: Vec<f64> = Vec::<f32>::try_from(value)
                .expect("value output is contiguous f32")
                .into_iter()
                .map(f64::from)
                .collect();
            (policies, values)
        })
    }

    // ------------------------------------------------------------------
    // Flat weight access (shared with NEAT)
    // ------------------------------------------------------------------

    /// Canonical flattening of the policy head.
    pub fn get_policy_weights(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(policy_weight_count(self.config.hidden_size));
        append_linear(&self.policy_net.fc1, &mut out);
        append_linear(&self.policy_net.head, &mut out);
        out
    }

    /// Canonical flattening of the value head.
    pub fn get_value_weights(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(value_weight_count(self.config.hidden_size));
        append_linear(&self.value_net.fc1, &mut out);
        append_linear(&self.value_net.head, &mut out);
        out
    }

    /// Replaces the policy head weights. A buffer of the wrong length is
    /// rejected before any mutation.
    pub fn set_policy_weights(&mut self, weights: &[f32]) -> Result<()> {
        let expected = policy_weight_count(self.config.hidden_size);
        if weights.len() != expected {
            return Err(RpsError::SizeMismatch {
                expected,
                got: weights.len(),
            });
        }
        let offset = load_linear(&mut self.policy_net.fc1, weights, 0);
        load_linear(&mut self.policy_net.head, weights, offset);
        Ok(())
    }

    /// Replaces the value head weights, with the same rejection contract.
    pub fn set_value_weights(&mut self, weights: &[f32]) -> Result<()> {
        let expected = value_weight_count(self.config.hidden_size);
        if weights.len() != expected {
            return Err(RpsError::SizeMismatch {
                expected,
                got: weights.len(),
            });
        }
        let offset = load_linear(&mut self.value_net.fc1, weights, 0);
        load_linear(&mut self.value_net.head, weights, offset);
        Ok(())
    }

    /// Deep copy through the flat weight contract; the clone shares no
    /// tensors with `self` and is safe to hand to another worker thread.
    pub fn try_clone(&self) -> Result<Evaluator> {
        let mut clone = Self::new(&self.config)?;
        clone.set_policy_weights(&self.get_policy_weights())?;
        clone.set_value_weights(&self.get_value_weights())?;
        Ok(clone)
    }

    // ------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------

    /// One gradient step per head over `batch`: cross-entropy against the
    /// visit distribution for the policy, squared error for the value.
    /// Returns the pre-step losses.
    pub fn train_step(&mut self, batch: &[TrainingExample], lr: f64) -> Result<(f64, f64)> {
        if batch.is_empty() {
            return Ok((0.0, 0.0));
        }
        let n = batch.len() as i64;

        let mut features = Vec::with_capacity(batch.len() * FEATURE_LEN);
        let mut policy_targets = Vec::with_capacity(batch.len() * BOARD_SIZE);
        let mut value_targets = Vec::with_capacity(batch.len());
        for example in batch {
            features.extend_from_slice(&example.features);
            policy_targets.extend_from_slice(&example.policy_target);
            value_targets.push(example.value_target);
        }

        let input = Tensor::from_slice(&features).view([n, FEATURE_LEN as i64]);
        let policy_target = Tensor::from_slice(&policy_targets).view([n, BOARD_SIZE as i64]);
        let value_target = Tensor::from_slice(&value_targets).view([n, 1]);

        let pred_policy = self.policy_net.forward(&input).clamp_min(1e-7);
        let policy_loss =
            -(policy_target * pred_policy.log()).sum(tch::Kind::Float) / (n as f64);
        self.opt_policy.set_lr(lr);
        self.opt_policy.backward_step(&policy_loss);

        let pred_value = self.value_net.forward(&input);
        let value_loss = pred_value.mse_loss(&value_target, tch::Reduction::Mean);
        self.opt_value.set_lr(lr);
        self.opt_value.backward_step(&value_loss);

        Ok((
            policy_loss.double_value(&[]),
            value_loss.double_value(&[]),
        ))
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Writes both heads to safetensors files. The stored shapes are enough
    /// to rebuild the evaluator without out-of-band configuration.
    pub fn save(
        &self,
        policy_path: impl AsRef<Path>,
        value_path: impl AsRef<Path>,
    ) -> Result<()> {
        save_varstore(&self.vs_policy, policy_path)?;
        save_varstore(&self.vs_value, value_path)?;
        Ok(())
    }

    /// Rebuilds an evaluator from checkpoint files, recovering the hidden
    /// width from the stored layer shapes.
    pub fn load(
        policy_path: impl AsRef<Path>,
        value_path: impl AsRef<Path>,
    ) -> Result<Evaluator> {
        let shape = stored_shape(&policy_path, "fc1.weight")?;
        let hidden_size = *shape.first().ok_or_else(|| {
            RpsError::Model("stored fc1.weight has no dimensions".to_string())
        })?;
        let config = EvaluatorConfig {
            hidden_size,
            ..Default::default()
        };
        let mut evaluator = Self::new(&config)?;
        evaluator.load_weights(policy_path, value_path)?;
        Ok(evaluator)
    }

    /// Reloads checkpoint files into this evaluator in place.
    pub fn load_weights(
        &mut self,
        policy_path: impl AsRef<Path>,
        value_path: impl AsRef<Path>,
    ) -> Result<()> {
        load_varstore(&mut self.vs_policy, policy_path)?;
        load_varstore(&mut self.vs_value, value_path)?;
        Ok(())
    }
}

fn append_linear(layer: &nn::Linear, out: &mut Vec<f32>) {
    let ws: Vec<f32> = Vec::try_from(layer.ws.flatten(0, -1).contiguous())
        .expect("weight tensor is contiguous f32");
    out.extend(ws);
    let bs = layer.bs.as_ref().expect("linear layers are built with biases");
    let bs: Vec<f32> =
        Vec::try_from(bs.flatten(0, -1).contiguous()).expect("bias tensor is contiguous f32");
    out.extend(bs);
}

/// Copies `weights[offset..]` into the layer, returning the new offset.
fn load_linear(layer: &mut nn::Linear, weights: &[f32], offset: usize) -> usize {
    let ws_len = layer.ws.numel();
    let ws_shape = layer.ws.size();
    let bs = layer.bs.as_mut().expect("linear layers are built with biases");
    let bs_len = bs.numel();

    tch::no_grad(|| {
        let ws_chunk = &weights[offset..offset + ws_len];
        layer
            .ws
            .copy_(&Tensor::from_slice(ws_chunk).reshape(&ws_shape));
        let bs_chunk = &weights[offset + ws_len..offset + ws_len + bs_len];
        bs.copy_(&Tensor::from_slice(bs_chunk));
    });
    offset + ws_len + bs_len
}
