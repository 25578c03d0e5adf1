pub mod reporter;
pub mod webcam;

pub use reporter::{DiagnosticsReporter, ReporterContext};
pub use webcam::{PoseFaceSource, WebcamReading, WebcamSignals};
