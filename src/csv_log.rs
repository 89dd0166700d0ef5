use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::types::PredictionRecord;

pub const HEADER: [&str; 6] = ["timestamp", "temp", "hum", "gas", "flame", "status"];

/// Append-only CSV of every prediction. Never read back by the service.
#[derive(Debug)]
pub struct CsvLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLog {
    /// Creates the parent directory and writes the header if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let log = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        if let Some(dir) = log.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        log.open_with_header()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &PredictionRecord) -> io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = self.open_with_header()?;
        file.write_all(format_row(record).as_bytes())?;
        file.flush()
    }

    // Callers other than `open` hold `write_lock`.
    fn open_with_header(&self) -> io::Result<fs::File> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file.write_all(format!("{}\r\n", HEADER.join(",")).as_bytes())?;
        }
        Ok(file)
    }
}

/// One CSV line (CRLF-terminated) in header column order.
pub fn format_row(r: &PredictionRecord) -> String {
    let fields = [
        escape(&r.timestamp),
        format!("{:?}", r.temperature),
        format!("{:?}", r.humidity),
        format!("{:?}", r.gas),
        format!("{:?}", r.flame),
        escape(&r.status),
    ];
    format!("{}\r\n", fields.join(","))
}

fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
