pub mod generator;

pub use generator::ScenarioGenerator;
