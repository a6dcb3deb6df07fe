use serde::{Deserialize, Serialize};

/// One supervised example produced by self-play.
///
/// `policy_target` is the MCTS visit distribution over board positions and
/// sums to 1; `value_target` is the final game outcome from the recorded
/// player's perspective, one of {0.0, 0.5, 1.0}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: Vec<f32>,
    pub policy_target: Vec<f32>,
    pub value_target: f32,
}
