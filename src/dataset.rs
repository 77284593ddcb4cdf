use camino::Utf8PathBuf;

use crate::domain::{DatasetKind, Selection, SubjectId};
use crate::error::BiError;
use crate::fetch::ArchiveClient;
use crate::manifest::{Manifest, select_runs};
use crate::materialize::{ArchiveLayout, MaterializeOutcome, materialize};
use crate::recording::{Sessions, load_sessions};
use crate::resolve::{SessionPaths, resolve, resolve_flat};
use crate::store::Store;

const BRAININVADERS_URL: &str = "https://zenodo.org/record/2644077/files/";
const BRAININVADERS2013_URL: &str = "https://zenodo.org/record/2669187/files/";
const MANIFEST_FILE: &str = "meta.yml";

/// Subjects of the 2013 release whose data is split into one archive per
/// session, and how many sessions they recorded.
const SPLIT_SUBJECTS: std::ops::RangeInclusive<u32> = 1..=7;
const SPLIT_SESSIONS: u32 = 8;

const CHANNELS_UPPER: [&str; 17] = [
    "FP1", "FP2", "F5", "AFz", "F6", "T7", "Cz", "T8", "P7", "P3", "Pz", "P4", "P8", "O1", "Oz",
    "O2", "STI 014",
];
const CHANNELS_MIXED: [&str; 17] = [
    "Fp1", "Fp2", "F5", "AFz", "F6", "T7", "Cz", "T8", "P7", "P3", "Pz", "P4", "P8", "O1", "Oz",
    "O2", "STI 014",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub url: String,
    pub layout: ArchiveLayout,
}

impl DatasetKind {
    pub fn namespace(self) -> &'static str {
        match self {
            DatasetKind::BrainInvaders => "BRAININVADERS",
            DatasetKind::BrainInvaders2013 => "BRAININVADERS2013",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            DatasetKind::BrainInvaders => BRAININVADERS_URL,
            DatasetKind::BrainInvaders2013 => BRAININVADERS2013_URL,
        }
    }

    pub fn channel_names(self) -> &'static [&'static str] {
        match self {
            DatasetKind::BrainInvaders => &CHANNELS_UPPER,
            DatasetKind::BrainInvaders2013 => &CHANNELS_MIXED,
        }
    }

    pub fn archives(self, subject: SubjectId) -> Vec<ArchiveSpec> {
        let n = subject.get();
        match self {
            DatasetKind::BrainInvaders => vec![ArchiveSpec {
                url: format!("{}subject{n}.zip", self.base_url()),
                layout: ArchiveLayout::Subject {
                    legacy_dir: format!("subject{n}"),
                },
            }],
            DatasetKind::BrainInvaders2013 if SPLIT_SUBJECTS.contains(&n) => (1..=SPLIT_SESSIONS)
                .map(|session| ArchiveSpec {
                    url: format!("{}subject{n:02}_session{session:02}.zip", self.base_url()),
                    layout: ArchiveLayout::Session { session },
                })
                .collect(),
            DatasetKind::BrainInvaders2013 => vec![ArchiveSpec {
                url: format!("{}subject{n:02}.zip", self.base_url()),
                layout: ArchiveLayout::Session { session: 1 },
            }],
        }
    }
}

/// Entry point for one dataset variant: which runs to keep and where the
/// archive cache lives.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    selection: Selection,
    store: Store,
}

impl Dataset {
    pub fn new(kind: DatasetKind, selection: Selection, store: Store) -> Self {
        Self {
            kind,
            selection,
            store,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subjects(&self) -> Vec<SubjectId> {
        SubjectId::all().collect()
    }

    pub fn subject(&self, number: u32) -> Result<SubjectId, BiError> {
        SubjectId::new(number)
    }

    pub fn subject_dir(&self, subject: SubjectId) -> Utf8PathBuf {
        self.store
            .namespace_dir(self.kind.namespace())
            .join(subject.dir_name())
    }

    /// Downloads and extracts every archive of `subject` that is not on disk yet.
    pub fn materialize_subject(
        &self,
        client: &dyn ArchiveClient,
        subject: SubjectId,
    ) -> Result<Vec<MaterializeOutcome>, BiError> {
        let mut outcomes = Vec::new();
        for archive in self.kind.archives(subject) {
            let path = self
                .store
                .fetch_archive(client, &archive.url, self.kind.namespace())?;
            outcomes.push(materialize(&path, subject, &archive.layout)?);
        }
        Ok(outcomes)
    }

    pub fn manifest(&self, subject: SubjectId) -> Result<Manifest, BiError> {
        let path = self.subject_dir(subject).join(MANIFEST_FILE);
        Manifest::load(path.as_std_path())
    }

    pub fn selected_runs(&self, subject: SubjectId) -> Result<Vec<String>, BiError> {
        Ok(select_runs(&self.manifest(subject)?, &self.selection))
    }

    /// Selected recordings of `subject`, grouped by session.
    pub fn subject_runs(
        &self,
        client: &dyn ArchiveClient,
        subject: u32,
    ) -> Result<SessionPaths, BiError> {
        let subject = self.subject(subject)?;
        self.materialize_subject(client, subject)?;
        let filenames = self.selected_runs(subject)?;
        resolve(&self.subject_dir(subject), &filenames)
    }

    /// Selected recordings of `subject` as a flat list in manifest order.
    pub fn data_path(
        &self,
        client: &dyn ArchiveClient,
        subject: u32,
    ) -> Result<Vec<Utf8PathBuf>, BiError> {
        let subject = self.subject(subject)?;
        self.materialize_subject(client, subject)?;
        let filenames = self.selected_runs(subject)?;
        resolve_flat(&self.subject_dir(subject), &filenames)
    }

    pub fn get_single_subject_data(
        &self,
        client: &dyn ArchiveClient,
        subject: u32,
    ) -> Result<Sessions, BiError> {
        let paths = self.subject_runs(client, subject)?;
        load_sessions(&paths, self.kind.channel_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_archive_urls() {
        let subject = SubjectId::new(3).unwrap();
        let archives = DatasetKind::BrainInvaders.archives(subject);
        assert_eq!(archives.len(), 1);
        assert_eq!(
            archives[0].url,
            "https://zenodo.org/record/2644077/files/subject3.zip"
        );
        assert_eq!(
            archives[0].layout,
            ArchiveLayout::Subject {
                legacy_dir: "subject3".to_string()
            }
        );
    }

    #[test]
    fn split_subjects_have_one_archive_per_session() {
        let early = DatasetKind::BrainInvaders2013.archives(SubjectId::new(7).unwrap());
        assert_eq!(early.len(), 8);
        assert_eq!(
            early[7].url,
            "https://zenodo.org/record/2669187/files/subject07_session08.zip"
        );
        assert_eq!(early[7].layout, ArchiveLayout::Session { session: 8 });

        let late = DatasetKind::BrainInvaders2013.archives(SubjectId::new(12).unwrap());
        assert_eq!(late.len(), 1);
        assert!(late[0].url.ends_with("/subject12.zip"));
    }

    #[test]
    fn channel_layouts() {
        for kind in [DatasetKind::BrainInvaders, DatasetKind::BrainInvaders2013] {
            let names = kind.channel_names();
            assert_eq!(names.len(), 17);
            assert_eq!(names[16], "STI 014");
        }
        assert_eq!(DatasetKind::BrainInvaders.channel_names()[0], "FP1");
        assert_eq!(DatasetKind::BrainInvaders2013.channel_names()[0], "Fp1");
    }
}
