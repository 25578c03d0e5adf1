pub mod prober;
pub mod screenpipe;
pub mod source;

pub use prober::{ScreenMonitor, StatusChange};
pub use screenpipe::ScreenpipeClient;
pub use source::{OcrQuery, ProbeError, ScreenCaptureSource, OCR_CONTENT_TYPE};
