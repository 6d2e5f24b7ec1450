pub mod analysis;
pub mod detection;
pub mod pipeline;
pub mod publishing;
pub mod rendering;
pub mod scheduling;
pub mod shared;
pub mod validation;
