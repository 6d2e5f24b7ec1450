use ort::execution_providers::ExecutionProviderDispatch;

/// Hardware-accelerated ONNX execution providers for the current platform.
///
/// Empty where no accelerator is wired up; the adapter then goes straight
/// to the plain CPU session.
pub fn accelerated_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default()
            .build()
            .error_on_failure()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default()
            .build()
            .error_on_failure()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}
