pub mod frame_scheduler;
pub mod frame_source;
pub mod image_sequence_source;
pub mod tick_host;
