//! Scrap Fill
//!
//! A desktop tool that fills a form from a PDF: drag a box around text on a
//! rendered page, the region is sent to OCR, and the cleaned-up text is
//! written into the matching form field, one field at a time.

// Hide console window on Windows release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod config;
mod controller;
mod document;
mod error;
mod form;
mod gui;
mod guided;
mod ocr;
mod paths;
mod selection;

use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("scrap_fill.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("scrap_fill.log");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    // Load configuration
    config::init_config();

    // Optional PDF to open at startup
    let initial_pdf = std::env::args_os().nth(1).map(PathBuf::from);

    log("Starting GUI application...");
    match gui::run_gui(initial_pdf) {
        Ok(()) => {
            log("GUI application exited normally");
            Ok(())
        }
        Err(e) => {
            log(&format!("GUI error: {}", e));
            Err(e)
        }
    }
}
