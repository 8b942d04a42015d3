pub mod orchestrator;

pub use orchestrator::{
    run_monte_carlo, MetricSummary, MonteCarloInput, MonteCarloOutput, ScenarioResult,
    StressResilience, DEFAULT_BLOCK_SIZE, DEFAULT_SCENARIOS,
};
