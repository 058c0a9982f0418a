// Observability: metric names, recording helpers, and the Prometheus textfile export

pub mod metrics;

pub use metrics::{install_recorder, write_textfile, MetricName};
