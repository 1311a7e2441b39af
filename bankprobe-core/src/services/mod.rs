//! Services - flow orchestration, reporting and event logging

pub mod flow;
pub mod logging;
pub mod report;

pub use flow::ApiFlowRunner;
pub use logging::{LogEntry, LogEvent, LogFilter, LoggingService, StepFailures};
pub use report::{DiagnosticReport, LineLevel, ReportLine, Step, Verdict};
