//! Fixed per-file profiles.
//!
//! A profile says how a supported file is parsed, which key identifies
//! "the same entry", and what happens when an incoming entry's key is
//! already present in the target.

use serde::Serialize;

/// Directory, relative to the mission root, that holds installed custom files.
pub const CUSTOM_SUBDIR: &str = "custom";

/// File-name suffix that routes a custom file to the restricted-area list.
pub const RESTRICTED_AREA_SUFFIX: &str = "-pra.json";

/// How records are laid out inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    /// Records are the elements of the array `field` inside the object
    /// found by walking `container` from the document root.
    ///
    /// Every `container` segment must exist; `field` is created when absent.
    JsonArray {
        container: &'static [&'static str],
        field: &'static str,
    },
    /// Records are synthesized `./custom/<file>` paths, routed by file name
    /// into one of two arrays.
    GameplayPaths(GameplayLayout),
    /// Records are the direct children of the document root.
    XmlTree { root: &'static str },
}

/// Where the gameplay config keeps its custom file lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameplayLayout {
    /// Object path holding both arrays; every segment is required.
    pub container: &'static [&'static str],
    /// Array receiving object spawner files.
    pub spawners: &'static str,
    /// Array receiving files ending in [`RESTRICTED_AREA_SUFFIX`].
    pub restricted: &'static str,
}

/// How a merge key is derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyStrategy {
    /// The whole record, compared structurally and independent of key order.
    FullValue,
    /// A single attribute (XML) or string field (JSON).
    Attribute(&'static str),
    /// Two attributes that must both be present.
    AttributePair(&'static str, &'static str),
}

/// What happens when an incoming record's key already exists in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// Keep the installed entry and drop the incoming one.
    #[default]
    InsertOnly,
    /// Remove every installed entry with the key and append the incoming one.
    ReplaceOnMatch,
}

/// Static descriptor for one supported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProfile {
    pub filename: &'static str,
    pub format: Format,
    pub key: KeyStrategy,
    pub policy: DuplicatePolicy,
}

pub const CFG_GAMEPLAY: FileProfile = FileProfile {
    filename: "cfggameplay.json",
    format: Format::GameplayPaths(GameplayLayout {
        container: &["WorldsData"],
        spawners: "objectSpawnersArr",
        restricted: "playerRestrictedAreaFiles",
    }),
    key: KeyStrategy::FullValue,
    policy: DuplicatePolicy::InsertOnly,
};

pub const UNDERGROUND_TRIGGERS: FileProfile = FileProfile {
    filename: "cfgundergroundtriggers.json",
    format: Format::JsonArray {
        container: &[],
        field: "Triggers",
    },
    key: KeyStrategy::FullValue,
    policy: DuplicatePolicy::InsertOnly,
};

pub const MAP_GROUP_POS: FileProfile = FileProfile {
    filename: "mapgrouppos.xml",
    format: Format::XmlTree { root: "map" },
    key: KeyStrategy::AttributePair("name", "pos"),
    policy: DuplicatePolicy::InsertOnly,
};

pub const MAP_GROUP_PROTO: FileProfile = FileProfile {
    filename: "mapgroupproto.xml",
    format: Format::XmlTree { root: "prototype" },
    key: KeyStrategy::Attribute("name"),
    policy: DuplicatePolicy::InsertOnly,
};

pub const SPAWNABLE_TYPES: FileProfile = FileProfile {
    filename: "cfgspawnabletypes.xml",
    format: Format::XmlTree {
        root: "spawnabletypes",
    },
    key: KeyStrategy::Attribute("name"),
    policy: DuplicatePolicy::ReplaceOnMatch,
};

/// Every supported file, in processing order.
pub const PROFILES: &[FileProfile] = &[
    CFG_GAMEPLAY,
    UNDERGROUND_TRIGGERS,
    MAP_GROUP_POS,
    MAP_GROUP_PROTO,
    SPAWNABLE_TYPES,
];

impl FileProfile {
    /// Find the profile for a file name (ASCII case-insensitive).
    pub fn lookup(filename: &str) -> Option<&'static FileProfile> {
        PROFILES
            .iter()
            .find(|p| p.filename.eq_ignore_ascii_case(filename))
    }

    /// Attribute carrying the entry id, if the key is attribute based.
    pub fn id_attribute(&self) -> Option<&'static str> {
        match self.key {
            KeyStrategy::Attribute(id) | KeyStrategy::AttributePair(id, _) => Some(id),
            KeyStrategy::FullValue => None,
        }
    }

    /// Attributes forming a composite key, empty unless the key is a pair.
    pub fn composite_key_fields(&self) -> Vec<&'static str> {
        match self.key {
            KeyStrategy::AttributePair(id, extra) => vec![id, extra],
            _ => Vec::new(),
        }
    }

    pub fn overwrite_on_key_match(&self) -> bool {
        self.policy == DuplicatePolicy::ReplaceOnMatch
    }

    pub fn is_xml(&self) -> bool {
        matches!(self.format, Format::XmlTree { .. })
    }
}

impl std::fmt::Display for FileProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filename)
    }
}
