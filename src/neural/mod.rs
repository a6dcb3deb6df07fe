pub mod evaluator;
pub mod model_io;
pub mod policy_value_net;

pub use evaluator::{
    policy_weight_count, value_weight_count, Evaluator, EvaluatorConfig,
};
pub use policy_value_net::{PolicyNet, ValueNet};
