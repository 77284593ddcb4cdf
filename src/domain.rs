use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::BiError;

pub const SUBJECT_COUNT: u32 = 24;

static SESSION_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Session(\d+)$").expect("session pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SubjectId(u32);

impl SubjectId {
    pub fn new(value: u32) -> Result<Self, BiError> {
        if !(1..=SUBJECT_COUNT).contains(&value) {
            return Err(BiError::InvalidSubject(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn all() -> impl Iterator<Item = SubjectId> {
        (1..=SUBJECT_COUNT).map(SubjectId)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// `subject_07` style directory name shared by every dataset variant.
    pub fn dir_name(self) -> String {
        format!("subject_{:02}", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = BiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let number = value
            .trim()
            .parse::<u32>()
            .map_err(|_| BiError::InvalidSubject(value.to_string()))?;
        Self::new(number)
    }
}

impl TryFrom<u32> for SubjectId {
    type Error = BiError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for u32 {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Zenodo record 2644077, one `subject<N>.zip` per subject.
    #[value(name = "braininvaders")]
    BrainInvaders,
    /// Zenodo record 2669187, subjects 1 to 7 split into one archive per session.
    #[value(name = "braininvaders2013")]
    BrainInvaders2013,
}

impl DatasetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::BrainInvaders => "braininvaders",
            DatasetKind::BrainInvaders2013 => "braininvaders2013",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = BiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "braininvaders" => Ok(DatasetKind::BrainInvaders),
            "braininvaders2013" => Ok(DatasetKind::BrainInvaders2013),
            _ => Err(BiError::InvalidDataset(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Adaptive,
    NonAdaptive,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationType {
    Training,
    Online,
    #[serde(other)]
    Other,
}

/// Which runs of a subject to keep. Each flag adds its condition or type to
/// the accepted set; a run is kept when both its condition and its type are
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub non_adaptive: bool,
    pub adaptive: bool,
    pub training: bool,
    pub online: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            non_adaptive: true,
            adaptive: false,
            training: true,
            online: false,
        }
    }
}

impl Selection {
    pub fn accepted_conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if self.adaptive {
            conditions.push(Condition::Adaptive);
        }
        if self.non_adaptive {
            conditions.push(Condition::NonAdaptive);
        }
        conditions
    }

    pub fn accepted_types(&self) -> Vec<PresentationType> {
        let mut types = Vec::new();
        if self.training {
            types.push(PresentationType::Training);
        }
        if self.online {
            types.push(PresentationType::Online);
        }
        types
    }

    pub fn accepts(&self, condition: Condition, kind: PresentationType) -> bool {
        self.accepted_conditions().contains(&condition) && self.accepted_types().contains(&kind)
    }

    /// Applies explicitly set flags on top of `self`. Condition flags and
    /// type flags override independently; a group with no flag set keeps
    /// the values of `self`.
    pub fn overridden_by(self, flags: Selection) -> Selection {
        let mut merged = self;
        if flags.non_adaptive || flags.adaptive {
            merged.non_adaptive = flags.non_adaptive;
            merged.adaptive = flags.adaptive;
        }
        if flags.training || flags.online {
            merged.training = flags.training;
            merged.online = flags.online;
        }
        merged
    }
}

/// Session key parsed from a `Session<digits>` directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionName {
    number: u32,
    label: String,
}

impl SessionName {
    pub fn from_dir_name(name: &str) -> Result<Self, BiError> {
        let digits = SESSION_DIR
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| BiError::InvalidSessionName(name.to_string()))?;
        let number = digits
            .parse::<u32>()
            .map_err(|_| BiError::InvalidSessionName(name.to_string()))?;
        Ok(Self {
            number,
            label: digits.to_string(),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn dir_name(&self) -> String {
        format!("Session{}", self.label)
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.label)
    }
}

impl Serialize for SessionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Run key taken from the last `_`-separated segment of a file stem, so
/// `Subject1_Session1_3.mat` becomes `run_3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunName(String);

impl RunName {
    pub fn from_stem(stem: &str) -> Option<Self> {
        let label = match stem.rsplit_once('_') {
            Some((_, tail)) => tail,
            None => stem,
        };
        if label.is_empty() {
            return None;
        }
        Some(Self(label.to_string()))
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl fmt::Display for RunName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run_{}", self.0)
    }
}

impl Serialize for RunName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
