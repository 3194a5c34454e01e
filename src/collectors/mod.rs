/// Plain-text log reader feeding the log stream
pub mod line_collector;

pub use line_collector::LineCollector;
