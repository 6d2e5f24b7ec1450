pub mod geometric_analyzer;
