use ahash::AHashMap;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Number of tags in the master list shared by `all`, `genre`, `instrument`
/// and `moodtheme`.
pub const MASTER_TAGS: usize = 183;

/// Number of tags in the separate `top50tags` list.
pub const TOP50_TAGS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("failed to read tag list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("subset '{subset}' expects {expected} tags in its source list, found {found}")]
    Length {
        subset: Subset,
        expected: usize,
        found: usize,
    },
}

/// Active label subset.
///
/// All offsets into the master list live in [`Subset::range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Subset {
    #[value(name = "all")]
    All,
    #[value(name = "genre")]
    Genre,
    #[value(name = "instrument")]
    Instrument,
    #[value(name = "moodtheme")]
    MoodTheme,
    #[value(name = "top50tags")]
    Top50Tags,
}

impl Subset {
    /// Slice of the source tag list that forms this subset.
    pub fn range(self) -> Range<usize> {
        match self {
            Subset::All => 0..MASTER_TAGS,
            Subset::Genre => 0..87,
            Subset::Instrument => 87..127,
            Subset::MoodTheme => 127..MASTER_TAGS,
            Subset::Top50Tags => 0..TOP50_TAGS,
        }
    }

    pub fn num_labels(self) -> usize {
        self.range().len()
    }

    /// Length the source tag list must have.
    pub fn source_len(self) -> usize {
        match self {
            Subset::Top50Tags => TOP50_TAGS,
            _ => MASTER_TAGS,
        }
    }

    pub fn tag_list_file(self) -> &'static str {
        match self {
            Subset::Top50Tags => "tag_list_50.txt",
            _ => "tag_list.txt",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subset::All => "all",
            Subset::Genre => "genre",
            Subset::Instrument => "instrument",
            Subset::MoodTheme => "moodtheme",
            Subset::Top50Tags => "top50tags",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered names of the active labels; position is the model output column.
#[derive(Debug, Clone)]
pub struct LabelSet {
    subset: Subset,
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl LabelSet {
    pub fn from_source(source: Vec<String>, subset: Subset) -> Result<Self, LabelError> {
        if source.len() != subset.source_len() {
            return Err(LabelError::Length {
                subset,
                expected: subset.source_len(),
                found: source.len(),
            });
        }

        let names = source[subset.range()].to_vec();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Ok(Self {
            subset,
            names,
            index,
        })
    }

    /// Reads `<dir>/<tag list file>`, one tag per line.
    pub fn load(dir: &Path, subset: Subset) -> Result<Self, LabelError> {
        let path = dir.join(subset.tag_list_file());
        let content = fs::read_to_string(&path).map_err(|source| LabelError::Io {
            path: path.clone(),
            source,
        })?;

        let source: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        let labels = Self::from_source(source, subset)?;
        log::info!(
            "Loaded {} labels for subset '{}' from {}",
            labels.len(),
            subset,
            path.display()
        );
        Ok(labels)
    }

    pub fn subset(&self) -> Subset {
        self.subset
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Names of the per-label metric files written by the evaluation runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactNames {
    pub subset: Subset,
    pub split: u32,
}

impl ArtifactNames {
    pub fn new(subset: Subset, split: u32) -> Self {
        Self { subset, split }
    }

    pub fn roc_auc(&self) -> String {
        format!("roc_auc_{}_{}.npy", self.subset, self.split)
    }

    pub fn pr_auc(&self) -> String {
        format!("pr_auc_{}_{}.npy", self.subset, self.split)
    }
}
