pub mod evaluator;
pub mod policy;
pub mod status;
