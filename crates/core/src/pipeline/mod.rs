pub mod pipeline_logger;
