//! Collects front-end startup reports.
//!
//! Every failure is logged with its port and dropped; nothing here can stop
//! the process or another front end.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::frontend::StartupReport;
use crate::guid::Guid;
use crate::observability::metrics;

/// Tally of the reports seen by the supervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorSummary {
    pub started: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl SupervisorSummary {
    fn record(&mut self, report: &StartupReport) {
        match &report.outcome {
            Ok(()) => {
                tracing::info!(
                    front_end = report.front_end,
                    port = report.port,
                    root = report.root.as_ref().map(Guid::as_str),
                    "Front end started"
                );
                self.started.push(report.front_end);
            }
            Err(e) => {
                tracing::error!(
                    front_end = report.front_end,
                    port = report.port,
                    root = report.root.as_ref().map(Guid::as_str),
                    error = %e,
                    "Front end failed to start"
                );
                self.failed.push(report.front_end);
            }
        }
        metrics::record_startup(report.front_end, report.is_success());
    }
}

/// Consume reports until every sender is gone.
pub fn spawn_supervisor(mut reports: mpsc::UnboundedReceiver<StartupReport>) -> JoinHandle<SupervisorSummary> {
    tokio::spawn(async move {
        let mut summary = SupervisorSummary::default();
        while let Some(report) = reports.recv().await {
            summary.record(&report);
        }
        summary
    })
}
