//! Parser and writer for `tags.toml`.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gameplay_tags::{is_valid_segment, RegistryConfig, TagError, DEFAULT_MAX_DEPTH, PATH_SEPARATOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading, writing or validating a tags file.
#[derive(Debug, Error)]
pub enum TagsFileError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tags file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize tags file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid tags file: {0}")]
    Validation(String),

    #[error(transparent)]
    Registry(#[from] TagError),
}

/// Validated contents of a `tags.toml` file.
///
/// Paths are kept as written (deduplicated and sorted). Use
/// [`entries`](Self::entries) for the ancestor-expanded view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsFile {
    /// Optional depth limit. Falls back to [`DEFAULT_MAX_DEPTH`].
    pub max_depth: Option<usize>,
    paths: BTreeSet<String>,
}

/// A single tag with its computed position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Full dot-separated path (e.g., "Combat.Melee.Slash")
    pub path: String,
    /// Tree depth (0 = root)
    pub depth: usize,
    /// Parent path (None for root tags)
    pub parent: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawTagsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_depth: Option<usize>,
    #[serde(default)]
    tags: RawTags,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawTags {
    #[serde(default)]
    paths: Vec<String>,
}

impl FromStr for TagsFile {
    type Err = TagsFileError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let raw: RawTagsFile = toml::from_str(content)?;
        Self::from_paths(raw.tags.paths, raw.max_depth)
    }
}

impl TagsFile {
    /// Empty file with an optional depth limit.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            paths: BTreeSet::new(),
        }
    }

    /// Validate `paths` and build a file from them.
    pub fn from_paths<I, S>(paths: I, max_depth: Option<usize>) -> Result<Self, TagsFileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if max_depth == Some(0) {
            return Err(TagsFileError::Validation("max_depth must be at least 1".into()));
        }
        let limit = max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        let mut set = BTreeSet::new();
        for path in paths {
            let path = path.into();
            validate_path(&path, limit)?;
            set.insert(path);
        }
        Ok(Self {
            max_depth,
            paths: set,
        })
    }

    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TagsFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TagsFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Paths as written, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.paths.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub(crate) fn paths_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.paths
    }

    /// Every path plus its ancestors, deduplicated and sorted by path.
    ///
    /// e.g., "A.B.C" expands to ["A", "A.B", "A.B.C"]
    pub fn entries(&self) -> Vec<TagEntry> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();
        for path in &self.paths {
            let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
            for depth in 0..segments.len() {
                let ancestor = segments[..=depth].join(".");
                if seen.insert(ancestor.clone()) {
                    entries.push(TagEntry {
                        path: ancestor,
                        depth,
                        parent: (depth > 0).then(|| segments[..depth].join(".")),
                    });
                }
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Copy of this file with every ancestor listed explicitly.
    pub fn expanded(&self) -> TagsFile {
        TagsFile {
            max_depth: self.max_depth,
            paths: self.entries().into_iter().map(|e| e.path).collect(),
        }
    }

    /// Registry settings this file asks for.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::with_max_depth(self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
    }

    pub fn to_toml_string(&self) -> Result<String, TagsFileError> {
        let raw = RawTagsFile {
            max_depth: self.max_depth,
            tags: RawTags {
                paths: self.paths.iter().cloned().collect(),
            },
        };
        Ok(toml::to_string_pretty(&raw)?)
    }

    /// Write to `path`, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), TagsFileError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| TagsFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn validate_path(path: &str, max_depth: usize) -> Result<(), TagsFileError> {
    if path.is_empty() {
        return Err(TagsFileError::Validation("empty path not allowed".into()));
    }
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
        return Err(TagsFileError::Validation(format!(
            "invalid path '{path}': segment '{bad}' must be non-empty and alphanumeric"
        )));
    }
    if segments.len() > max_depth {
        return Err(TagsFileError::Validation(format!(
            "path '{path}' is {} levels deep (max {max_depth})",
            segments.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_file() {
        let toml = r#"
[tags]
paths = [
    "Item.Weapon.Sword",
    "Item.Weapon.Axe",
    "Skill.Combat",
]
"#;
        let file: TagsFile = toml.parse().unwrap();

        assert_eq!(file.max_depth, None);
        assert_eq!(file.len(), 3);
        // Item, Item.Weapon, Item.Weapon.Axe, Item.Weapon.Sword, Skill, Skill.Combat
        assert_eq!(file.entries().len(), 6);
    }

    #[test]
    fn expand_creates_parents() {
        let file: TagsFile = "[tags]\npaths = [\"A.B.C.D\"]\n".parse().unwrap();
        let entries = file.entries();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].path, "A");
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[0].parent, None);

        assert_eq!(entries[3].path, "A.B.C.D");
        assert_eq!(entries[3].depth, 3);
        assert_eq!(entries[3].parent, Some("A.B.C".into()));
    }

    #[test]
    fn expanded_lists_ancestors() {
        let file = TagsFile::from_paths(["A.B.C", "X"], None).unwrap();
        let expanded = file.expanded();
        assert_eq!(
            expanded.paths().collect::<Vec<_>>(),
            vec!["A", "A.B", "A.B.C", "X"]
        );
        assert_eq!(expanded.expanded(), expanded);
    }

    #[test]
    fn duplicate_paths_collapse() {
        let file: TagsFile = "[tags]\npaths = [\"A.B\", \"A.B\", \"A\"]\n".parse().unwrap();
        assert_eq!(file.paths().collect::<Vec<_>>(), vec!["A", "A.B"]);
    }

    #[test]
    fn missing_tags_table_is_empty() {
        let file: TagsFile = "max_depth = 6\n".parse().unwrap();
        assert!(file.is_empty());
        assert_eq!(file.registry_config().max_depth, 6);
    }

    #[test]
    fn rejects_invalid_paths() {
        let cases = [
            "",     // empty
            ".A",   // starts with dot
            "A.",   // ends with dot
            "A..B", // double dot
            "A.B-C",
            "A.B C",
            "A.B_C", // underscores are not alphanumeric
        ];
        for case in cases {
            let toml = format!("[tags]\npaths = [\"{case}\"]\n");
            assert!(
                matches!(toml.parse::<TagsFile>(), Err(TagsFileError::Validation(_))),
                "should reject: {case:?}"
            );
        }
    }

    #[test]
    fn accepts_digits_anywhere() {
        let file: TagsFile = "[tags]\npaths = [\"Tier1.2x\", \"With123Numbers\"]\n"
            .parse()
            .unwrap();
        assert_eq!(file.len(), 2);
    }

    #[test]
    fn enforces_depth_limit() {
        let default_limit = "[tags]\npaths = [\"A.B.C.D.E\"]\n".parse::<TagsFile>();
        assert!(matches!(default_limit, Err(TagsFileError::Validation(_))));

        let raised = "max_depth = 5\n[tags]\npaths = [\"A.B.C.D.E\"]\n".parse::<TagsFile>();
        assert!(raised.is_ok());

        let zero = "max_depth = 0\n".parse::<TagsFile>();
        assert!(matches!(zero, Err(TagsFileError::Validation(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = "[tags\npaths = ".parse::<TagsFile>();
        assert!(matches!(result, Err(TagsFileError::Parse(_))));
    }

    #[test]
    fn serialized_form_parses_back() {
        let file = TagsFile::from_paths(["Combat.Melee", "Combat"], Some(5)).unwrap();
        let text = file.to_toml_string().unwrap();
        assert!(text.contains("max_depth = 5"));
        assert_eq!(text.parse::<TagsFile>().unwrap(), file);
    }
}
