#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;

use bi_data::error::BiError;
use bi_data::fetch::ArchiveClient;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const TARGET: f64 = 33285.0;
pub const NON_TARGET: f64 = 33286.0;

/// Serves in-memory zip archives keyed by URL and counts downloads.
#[derive(Default)]
pub struct MockZenodo {
    archives: HashMap<String, Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockZenodo {
    pub fn with_archive(mut self, url: &str, entries: &[(&str, Vec<u8>)]) -> Self {
        self.archives.insert(url.to_string(), zip_bytes(entries));
        self
    }

    pub fn downloads(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ArchiveClient for MockZenodo {
    fn download(&self, url: &str, destination: &Path) -> Result<(), BiError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.archives.get(url) {
            Some(bytes) => {
                std::fs::write(destination, bytes).unwrap();
                Ok(())
            }
            None => Err(BiError::HttpStatus {
                status: 404,
                message: format!("no archive at {url}"),
            }),
        }
    }
}

/// Fails the test if any download is attempted.
pub struct OfflineClient;

impl ArchiveClient for OfflineClient {
    fn download(&self, url: &str, _destination: &Path) -> Result<(), BiError> {
        panic!("unexpected download of {url}");
    }
}

pub fn zip_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn manifest(runs: &[(&str, &str, &str)]) -> Vec<u8> {
    let mut yaml = String::from("runs:\n");
    for (filename, condition, kind) in runs {
        yaml.push_str(&format!(
            "  - filename: {filename}\n    experimental_condition: {condition}\n    type: {kind}\n"
        ));
    }
    yaml.into_bytes()
}

/// Samples x 17 matrix: a ramp on every EEG channel and two flashes on the
/// stim channel.
pub fn run_matrix(samples: usize) -> (usize, usize, Vec<f64>) {
    let channels = 17;
    let mut column_major = Vec::with_capacity(samples * channels);
    for channel in 0..channels {
        for sample in 0..samples {
            let value = if channel == channels - 1 {
                match sample {
                    10 | 11 => TARGET,
                    40 => NON_TARGET,
                    _ => 0.0,
                }
            } else {
                (channel * 1000 + sample) as f64
            };
            column_major.push(value);
        }
    }
    (samples, channels, column_major)
}

pub fn run_file(samples: usize) -> Vec<u8> {
    let (rows, cols, values) = run_matrix(samples);
    mat_v5("data", rows, cols, &values)
}

/// Uncompressed MAT-file level 5 holding one real double matrix.
/// `values` are column-major, as MATLAB stores them.
pub fn mat_v5(name: &str, rows: usize, cols: usize, values: &[f64]) -> Vec<u8> {
    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;

    assert_eq!(rows * cols, values.len());

    let mut header = b"MATLAB 5.0 MAT-file, written by bi-data tests".to_vec();
    header.resize(116, b' ');
    header.extend_from_slice(&[0u8; 8]);
    header.extend_from_slice(&0x0100u16.to_le_bytes());
    header.extend_from_slice(b"IM");

    let mut body = Vec::new();
    push_tag(&mut body, MI_UINT32, 8);
    body.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());

    push_tag(&mut body, MI_INT32, 8);
    body.extend_from_slice(&(rows as i32).to_le_bytes());
    body.extend_from_slice(&(cols as i32).to_le_bytes());

    push_tag(&mut body, MI_INT8, name.len() as u32);
    body.extend_from_slice(name.as_bytes());
    pad8(&mut body);

    push_tag(&mut body, MI_DOUBLE, (values.len() * 8) as u32);
    for value in values {
        body.extend_from_slice(&value.to_le_bytes());
    }

    let mut out = header;
    push_tag(&mut out, MI_MATRIX, body.len() as u32);
    out.extend_from_slice(&body);
    out
}

fn push_tag(buf: &mut Vec<u8>, data_type: u32, len: u32) {
    buf.extend_from_slice(&data_type.to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
}

fn pad8(buf: &mut Vec<u8>) {
    while buf.len() % 8 != 0 {
        buf.push(0);
    }
}
