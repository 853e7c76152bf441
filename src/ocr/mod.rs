pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod worker;

pub use engine::{OcrLine, OcrService, OcrSpaceClient, OcrText, OcrWord};
pub use extract::normalize;
pub use preprocess::CompressionLimits;
pub use worker::{spawn_ocr_worker, OcrJob, OcrOutcome, OcrWorker};
