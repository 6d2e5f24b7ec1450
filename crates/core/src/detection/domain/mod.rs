pub mod detection_adapter;
pub mod detection_result;
