//! Loading of `.mat` run files into labeled multichannel time series.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;

use camino::Utf8Path;
use matfile::{MatFile, NumericData};
use ndarray::{Array2, ArrayView1, ShapeBuilder};
use serde::Serialize;

use crate::domain::{RunName, SessionName};
use crate::error::BiError;
use crate::resolve::SessionPaths;

pub const SAMPLING_RATE: f64 = 512.0;
pub const MONTAGE: &str = "standard_1020";
/// Name of the matrix variable inside each run file.
pub const DATA_VARIABLE: &str = "data";

pub type Sessions = BTreeMap<SessionName, BTreeMap<RunName, Recording>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Eeg,
    Stim,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Eeg => write!(f, "eeg"),
            ChannelType::Stim => write!(f, "stim"),
        }
    }
}

/// One run held in memory. `data` is samples × channels.
#[derive(Debug, Clone)]
pub struct Recording {
    pub data: Array2<f64>,
    pub channel_names: Vec<String>,
    pub channel_types: Vec<ChannelType>,
    pub sfreq: f64,
    pub montage: String,
}

impl Recording {
    /// Builds a recording whose last channel is the stimulus channel and
    /// every other channel is EEG.
    pub fn new(data: Array2<f64>, channel_names: &[&str], sfreq: f64) -> Result<Self, BiError> {
        if data.ncols() != channel_names.len() {
            return Err(BiError::Recording(format!(
                "expected {} channels, found {}",
                channel_names.len(),
                data.ncols()
            )));
        }
        let mut channel_types = vec![ChannelType::Eeg; channel_names.len()];
        if let Some(last) = channel_types.last_mut() {
            *last = ChannelType::Stim;
        }
        Ok(Self {
            data,
            channel_names: channel_names.iter().map(|name| name.to_string()).collect(),
            channel_types,
            sfreq,
            montage: MONTAGE.to_string(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.sfreq
    }

    pub fn channel(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.channel_names
            .iter()
            .position(|candidate| candidate == name)
            .map(|idx| self.data.column(idx))
    }

    pub fn stim_channel(&self) -> Option<ArrayView1<'_, f64>> {
        self.channel_types
            .iter()
            .position(|kind| *kind == ChannelType::Stim)
            .map(|idx| self.data.column(idx))
    }

    /// EEG columns only, samples × EEG channels.
    pub fn eeg_data(&self) -> Array2<f64> {
        let columns: Vec<usize> = self
            .channel_types
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind == ChannelType::Eeg)
            .map(|(idx, _)| idx)
            .collect();
        self.data.select(ndarray::Axis(1), &columns)
    }
}

pub fn load_recording(path: &Utf8Path, channel_names: &[&str]) -> Result<Recording, BiError> {
    let file = File::open(path.as_std_path())
        .map_err(|err| BiError::Recording(format!("open {path}: {err}")))?;
    let mat_file = MatFile::parse(BufReader::new(file))
        .map_err(|err| BiError::Recording(format!("parse {path}: {err:?}")))?;
    let array = mat_file.find_by_name(DATA_VARIABLE).ok_or_else(|| {
        BiError::Recording(format!("{path} has no `{DATA_VARIABLE}` variable"))
    })?;

    let size = array.size();
    if size.len() != 2 {
        return Err(BiError::Recording(format!(
            "{path}: expected a 2-D matrix, found {} dimensions",
            size.len()
        )));
    }
    let (rows, cols) = (size[0], size[1]);
    let flat = numeric_to_f64(array.data())
        .ok_or_else(|| BiError::Recording(format!("{path}: unsupported numeric type")))?;

    // MATLAB stores column-major.
    let stored = Array2::from_shape_vec((rows, cols).f(), flat)
        .map_err(|err| BiError::Recording(format!("{path}: {err}")))?;
    let n_channels = channel_names.len();
    // A square matrix is ambiguous and is read as samples x channels.
    let data = if cols == n_channels {
        stored
    } else if rows == n_channels {
        stored.reversed_axes()
    } else {
        return Err(BiError::Recording(format!(
            "{path}: matrix is {rows}x{cols}, expected {n_channels} channels"
        )));
    };

    tracing::debug!(%path, samples = data.nrows(), "loaded recording");
    Recording::new(data.as_standard_layout().into_owned(), channel_names, SAMPLING_RATE)
}

pub fn load_sessions(paths: &SessionPaths, channel_names: &[&str]) -> Result<Sessions, BiError> {
    let mut sessions = Sessions::new();
    for (session, files) in paths {
        let runs = sessions.entry(session.clone()).or_default();
        for path in files {
            let run = path
                .file_stem()
                .and_then(RunName::from_stem)
                .ok_or_else(|| BiError::Recording(format!("cannot derive run name from {path}")))?;
            let recording = load_recording(path, channel_names)?;
            if runs.insert(run.clone(), recording).is_some() {
                tracing::warn!(%session, %run, "duplicate run replaced");
            }
        }
    }
    Ok(sessions)
}

fn numeric_to_f64(data: &NumericData) -> Option<Vec<f64>> {
    let values = match data {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        _ => return None,
    };
    Some(values)
}
