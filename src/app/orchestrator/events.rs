//! Progress events emitted while a run is in flight

use crate::app::models::DownloadUnit;

/// Per-unit progress notification
#[derive(Debug, Clone)]
pub enum UnitEvent {
    /// A worker passed the limiter and started fetching
    Started { worker_id: usize, unit: DownloadUnit },
    /// Payload written to disk
    Succeeded { unit: DownloadUnit, bytes: usize },
    /// Fetch or write failed; the run continues
    Failed { unit: DownloadUnit, error: String },
}

impl UnitEvent {
    pub fn unit(&self) -> &DownloadUnit {
        match self {
            UnitEvent::Started { unit, .. }
            | UnitEvent::Succeeded { unit, .. }
            | UnitEvent::Failed { unit, .. } => unit,
        }
    }

    /// True for events that end a unit
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UnitEvent::Started { .. })
    }
}
