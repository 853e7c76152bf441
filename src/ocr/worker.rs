//! OCR worker thread.
//!
//! Runs in a separate thread, receiving encoded crops from the job queue,
//! calling the recognition service and sending results back. The UI thread
//! never blocks on the network.

use anyhow::Result;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::engine::{OcrService, OcrText};

/// A recognition request.
#[derive(Debug, Clone)]
pub struct OcrJob {
    /// Identifies the request when its result comes back
    pub ticket: u64,
    /// JPEG-encoded crop
    pub image: Vec<u8>,
}

/// A finished recognition request.
#[derive(Debug)]
pub struct OcrOutcome {
    pub ticket: u64,
    pub result: Result<OcrText>,
}

/// Handles to a running worker.
pub struct OcrWorker {
    pub jobs: Sender<OcrJob>,
    pub outcomes: Receiver<OcrOutcome>,
    pub handle: JoinHandle<()>,
}

/// Spawns the worker thread around `service`.
///
/// The worker exits when the job sender is dropped.
pub fn spawn_ocr_worker(service: Box<dyn OcrService>) -> OcrWorker {
    let (job_sender, job_receiver) = channel();
    let (outcome_sender, outcome_receiver) = channel();

    let handle = thread::spawn(move || {
        run_ocr_worker(job_receiver, outcome_sender, service);
    });

    OcrWorker {
        jobs: job_sender,
        outcomes: outcome_receiver,
        handle,
    }
}

/// Runs the OCR worker loop.
///
/// Processes jobs until the channel is closed (sender dropped). This function
/// blocks, so it should be run in a dedicated thread.
pub fn run_ocr_worker(
    receiver: Receiver<OcrJob>,
    results: Sender<OcrOutcome>,
    service: Box<dyn OcrService>,
) {
    crate::log("OCR worker started");

    while let Ok(job) = receiver.recv() {
        crate::log(&format!(
            "OCR worker: processing ticket {} ({} bytes)",
            job.ticket,
            job.image.len()
        ));

        let result = service.recognize(&job.image);
        match &result {
            Ok(text) => crate::log(&format!(
                "OCR worker: ticket {} recognized {} chars, {} lines",
                job.ticket,
                text.text.len(),
                text.lines.len()
            )),
            Err(e) => crate::log(&format!("OCR worker: ticket {} failed: {}", job.ticket, e)),
        }

        if results
            .send(OcrOutcome {
                ticket: job.ticket,
                result,
            })
            .is_err()
        {
            // Result receiver dropped, nobody is listening
            break;
        }
    }

    crate::log("OCR worker finished");
}
