//! # Modmerge Engine
//!
//! A deterministic merge engine for mod configuration fragments.
//!
//! This crate decides how a mod's configuration fragments are folded into a
//! server mission's existing files: which entries are new, which are already
//! installed, and which supersede an installed definition. Merges are
//! idempotent: running the same fragment against the result again reports
//! [`MergeResult::Unchanged`].
//!
//! ## Design Principles
//!
//! - **No IO**: the engine only sees byte buffers; reading, writing and
//!   backups belong to the caller
//! - **Deterministic**: same inputs always produce the same bytes
//! - **Explicit failure**: a malformed target or fragment is an [`Error`],
//!   never confused with "nothing to do"
//!
//! ## Core Concepts
//!
//! ### Profiles
//!
//! Every supported file has a fixed [`FileProfile`] (see [`PROFILES`]) naming
//! its [`Format`], its [`KeyStrategy`] and its [`DuplicatePolicy`].
//!
//! ### Merge keys
//!
//! The [`identity`] module derives a [`MergeKey`] per record: the whole
//! value for trigger lists, the `name` attribute for prototypes and
//! spawnable types, `name` plus `pos` for map group positions.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] walks incoming records in order against a
//! [`RecordSet`] built from the installed content, inserting unknown keys
//! and either skipping or replacing known ones.
//!
//! ## Quick Start
//!
//! ```rust
//! use modmerge_engine::{merge, MergeResult, Source, MAP_GROUP_PROTO};
//!
//! let installed = br#"<prototype><group name="Land_Shed"/></prototype>"#;
//! let fragment = br#"<prototype><group name="Land_Barn"/></prototype>"#;
//!
//! let result = merge::run(installed, Source::Fragment(fragment), &MAP_GROUP_PROTO).unwrap();
//! assert_eq!(result.change_count(), 1);
//!
//! let merged = result.into_content().unwrap();
//! let again = merge::run(&merged, Source::Fragment(fragment), &MAP_GROUP_PROTO).unwrap();
//! assert_eq!(again, MergeResult::Unchanged);
//! ```

pub mod error;
pub mod format;
pub mod identity;
pub mod merge;
pub mod profile;
pub mod reconcile;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use identity::{key, MergeKey, Record};
pub use merge::{run, run_with_report, MergeResult, Source};
pub use profile::{
    DuplicatePolicy, FileProfile, Format, GameplayLayout, KeyStrategy, CFG_GAMEPLAY,
    CUSTOM_SUBDIR, MAP_GROUP_POS, MAP_GROUP_PROTO, PROFILES, RESTRICTED_AREA_SUFFIX,
    SPAWNABLE_TYPES, UNDERGROUND_TRIGGERS,
};
pub use reconcile::{ReconcileReport, RecordSet, Reconciler};
