mod interview;
mod ocr;
mod snapshot;
mod status;
mod violation;

pub use interview::InterviewConfig;
pub use ocr::{ContentBody, ContentItem, OcrResult, OCR_CONTENT_KIND};
pub use snapshot::DiagnosticSnapshot;
pub use status::ConnectionStatus;
pub use violation::{Violation, TAB_NOT_ACTIVE};
