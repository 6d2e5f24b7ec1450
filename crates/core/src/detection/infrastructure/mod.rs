pub mod execution_provider;
pub mod onnx_blazeface_adapter;
pub mod replay_adapter;
