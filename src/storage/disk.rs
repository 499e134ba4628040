use super::base::{FeedItem, StorageBackend, StorageError};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Csv,
    JsonLines,
}

impl FeedFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, StorageError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FeedFormat::Csv),
            "jsonl" | "jl" => Ok(FeedFormat::JsonLines),
            _ => Err(StorageError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

enum FeedWriter {
    Csv {
        writer: csv::Writer<File>,
        header_written: bool,
    },
    JsonLines(BufWriter<File>),
}

/// Appends items to a single feed file, truncating it on creation.
pub struct DiskStorage {
    path: PathBuf,
    writer: Mutex<FeedWriter>,
}

impl DiskStorage {
    pub fn new<P: AsRef<Path>>(path: P, format: FeedFormat) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        let writer = match format {
            FeedFormat::Csv => FeedWriter::Csv {
                writer: csv::WriterBuilder::new().from_writer(file),
                header_written: false,
            },
            FeedFormat::JsonLines => FeedWriter::JsonLines(BufWriter::new(file)),
        };
        debug!("Opened {:?} feed at {}", format, path.display());

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }
}

#[async_trait]
impl StorageBackend for DiskStorage {
    async fn store<T: FeedItem + 'static>(&self, item: &T) -> Result<(), StorageError> {
        let mut writer = self.writer.lock();
        match &mut *writer {
            FeedWriter::Csv {
                writer,
                header_written,
            } => {
                if !*header_written {
                    writer.write_record(T::csv_header())?;
                    *header_written = true;
                }
                writer.write_record(item.csv_row())?;
            }
            FeedWriter::JsonLines(writer) => {
                serde_json::to_writer(&mut *writer, item)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), StorageError> {
        match &mut *self.writer.lock() {
            FeedWriter::Csv { writer, .. } => writer.flush()?,
            FeedWriter::JsonLines(writer) => writer.flush()?,
        }
        debug!("Flushed feed at {}", self.path.display());
        Ok(())
    }
}
