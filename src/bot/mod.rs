pub mod dispatcher;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;

pub use dispatcher::{candidate_queue, CandidateSender, Dispatcher};
pub use metrics::{BotMetrics, MetricsSnapshot};
pub use orchestrator::SandwichBot;
pub use pipeline::{PipelineDeps, SandwichPipeline};
