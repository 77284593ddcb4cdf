use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dataset::Dataset;
use crate::domain::{RunName, SessionName, SubjectId};
use crate::error::BiError;
use crate::events::{EventCounts, count_events, find_events};
use crate::fetch::ArchiveClient;
use crate::store::DownloadRecord;

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub dataset: String,
    pub items: Vec<FetchItemResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub subject: SubjectId,
    pub action: String,
    pub directory: Option<String>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_some()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunsResult {
    pub dataset: String,
    pub subject: SubjectId,
    pub sessions: BTreeMap<SessionName, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub dataset: String,
    pub subject: SubjectId,
    pub sessions: Vec<SessionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session: SessionName,
    pub runs: Vec<RunInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub run: RunName,
    pub samples: usize,
    pub channels: usize,
    pub sfreq: f64,
    pub duration_secs: f64,
    pub events: EventCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub archives: Vec<DownloadRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub namespace: String,
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: ArchiveClient> {
    dataset: Dataset,
    client: C,
}

impl<C: ArchiveClient> App<C> {
    pub fn new(dataset: Dataset, client: C) -> Self {
        Self { dataset, client }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Materializes each subject in turn. A failing subject is reported in
    /// its item and does not stop the others.
    pub fn fetch(&self, subjects: &[SubjectId], sink: &dyn ProgressSink) -> FetchResult {
        let mut items = Vec::new();
        for &subject in subjects {
            sink.event(ProgressEvent {
                message: format!("phase=Fetch; subject {subject}"),
                elapsed: None,
            });
            let start = Instant::now();
            let item = match self.dataset.materialize_subject(&self.client, subject) {
                Ok(outcomes) => {
                    let extracted = outcomes.iter().any(|outcome| outcome.extracted);
                    FetchItemResult {
                        subject,
                        action: if extracted { "extracted" } else { "cache" }.to_string(),
                        directory: Some(self.dataset.subject_dir(subject).to_string()),
                        error: None,
                    }
                }
                Err(err) => {
                    tracing::warn!(%subject, error = %err, "subject failed");
                    FetchItemResult {
                        subject,
                        action: "error".to_string(),
                        directory: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            sink.event(ProgressEvent {
                message: format!("phase=Store; subject {subject} {}", item.action),
                elapsed: Some(start.elapsed()),
            });
            items.push(item);
        }
        FetchResult {
            dataset: self.dataset.kind().to_string(),
            items,
        }
    }

    pub fn runs(&self, subject: u32, sink: &dyn ProgressSink) -> Result<RunsResult, BiError> {
        let subject = self.dataset.subject(subject)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; subject {subject}"),
            elapsed: None,
        });
        let paths = self.dataset.subject_runs(&self.client, subject.get())?;
        let sessions = paths
            .into_iter()
            .map(|(session, files)| {
                (
                    session,
                    files.into_iter().map(|path| path.to_string()).collect(),
                )
            })
            .collect();
        Ok(RunsResult {
            dataset: self.dataset.kind().to_string(),
            subject,
            sessions,
        })
    }

    pub fn info(&self, subject: u32, sink: &dyn ProgressSink) -> Result<InfoResult, BiError> {
        let subject = self.dataset.subject(subject)?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; subject {subject}"),
            elapsed: None,
        });
        let start = Instant::now();
        let loaded = self
            .dataset
            .get_single_subject_data(&self.client, subject.get())?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; {} sessions", loaded.len()),
            elapsed: Some(start.elapsed()),
        });

        let sessions = loaded
            .into_iter()
            .map(|(session, runs)| SessionInfo {
                session,
                runs: runs
                    .into_iter()
                    .map(|(run, recording)| RunInfo {
                        run,
                        samples: recording.n_samples(),
                        channels: recording.n_channels(),
                        sfreq: recording.sfreq,
                        duration_secs: recording.duration_secs(),
                        events: count_events(&find_events(&recording)),
                    })
                    .collect(),
            })
            .collect();
        Ok(InfoResult {
            dataset: self.dataset.kind().to_string(),
            subject,
            sessions,
        })
    }

    pub fn list(&self, sink: &dyn ProgressSink) -> Result<ListResult, BiError> {
        sink.event(ProgressEvent {
            message: "phase=Resolve; scanning cache".to_string(),
            elapsed: None,
        });
        Ok(ListResult {
            archives: self.dataset.store().list_records()?,
        })
    }

    pub fn clear(&self, sink: &dyn ProgressSink) -> Result<ClearResult, BiError> {
        let namespace = self.dataset.kind().namespace();
        sink.event(ProgressEvent {
            message: format!("phase=Store; clearing {namespace}"),
            elapsed: None,
        });
        Ok(ClearResult {
            namespace: namespace.to_string(),
            cleared: self.dataset.store().clear_namespace(namespace)?,
        })
    }
}
