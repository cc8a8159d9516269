pub mod exit_policy;
pub mod learning_recorder;
