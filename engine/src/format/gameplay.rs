//! Registration of installed custom files in the gameplay config.
//!
//! Each installed file becomes a `./custom/<file>` path record. Files ending
//! in `-pra.json` (any case) are player restricted areas; everything else is
//! an object spawner.

use crate::format::json::{JsonDocument, JsonShapeError};
use crate::profile::{FileProfile, GameplayLayout, CUSTOM_SUBDIR, RESTRICTED_AREA_SUFFIX};
use crate::reconcile::{ReconcileReport, RecordSet, Reconciler};
use serde_json::Value;

/// Which gameplay array a custom file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Spawners,
    RestrictedArea,
}

impl Route {
    pub fn for_file(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(RESTRICTED_AREA_SUFFIX) {
            Route::RestrictedArea
        } else {
            Route::Spawners
        }
    }

    fn field(self, layout: &GameplayLayout) -> &'static str {
        match self {
            Route::Spawners => layout.spawners,
            Route::RestrictedArea => layout.restricted,
        }
    }
}

/// Path under which the gameplay config refers to an installed file.
pub fn custom_path(filename: &str) -> String {
    format!("./{CUSTOM_SUBDIR}/{filename}")
}

/// Add a path record for every installed file not yet listed.
///
/// Both arrays are created when absent, so a target missing one of them is
/// not an error. A missing container object is.
pub fn register_installed(
    doc: &mut JsonDocument,
    layout: &GameplayLayout,
    profile: &FileProfile,
    installed: &[String],
) -> Result<ReconcileReport, JsonShapeError> {
    let reconciler = Reconciler::new(profile);
    let mut report = ReconcileReport::default();

    for route in [Route::Spawners, Route::RestrictedArea] {
        let field = route.field(layout);
        let incoming: Vec<Value> = installed
            .iter()
            .filter(|name| Route::for_file(name) == route)
            .map(|name| Value::String(custom_path(name)))
            .collect();

        let items = doc.array_mut(layout.container, field)?;
        let target = RecordSet::from_records(std::mem::take(items), profile.key);
        let (merged, routed) = reconciler.merge(target, incoming);
        *items = merged.into_records();

        for key in &routed.inserted {
            tracing::info!(file = profile.filename, array = field, path = %key, "registered custom file");
        }
        report.absorb(routed);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CFG_GAMEPLAY;
    use serde_json::json;

    fn layout() -> GameplayLayout {
        match CFG_GAMEPLAY.format {
            crate::profile::Format::GameplayPaths(layout) => layout,
            _ => unreachable!(),
        }
    }

    fn installed(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn routing_by_suffix() {
        assert_eq!(Route::for_file("zone1-pra.json"), Route::RestrictedArea);
        assert_eq!(Route::for_file("Zone1-PRA.JSON"), Route::RestrictedArea);
        assert_eq!(Route::for_file("spawns1.json"), Route::Spawners);
        assert_eq!(Route::for_file("pra.json"), Route::Spawners);
    }

    #[test]
    fn registers_each_file_once() {
        let mut doc = JsonDocument::parse(br#"{"WorldsData": {}}"#).unwrap();
        let files = installed(&["zone1-pra.json", "spawns1.json", "spawns1.json"]);

        let report = register_installed(&mut doc, &layout(), &CFG_GAMEPLAY, &files).unwrap();
        assert_eq!(report.change_count(), 2);

        let spawners = doc.records(&["WorldsData"], "objectSpawnersArr").unwrap();
        let restricted = doc
            .records(&["WorldsData"], "playerRestrictedAreaFiles")
            .unwrap();
        assert_eq!(spawners, vec![json!("./custom/spawns1.json")]);
        assert_eq!(restricted, vec![json!("./custom/zone1-pra.json")]);

        let report = register_installed(&mut doc, &layout(), &CFG_GAMEPLAY, &files).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn keeps_existing_entries_first() {
        let mut doc = JsonDocument::parse(
            br#"{"WorldsData": {"objectSpawnersArr": ["./custom/vanilla.json", 7]}}"#,
        )
        .unwrap();

        register_installed(&mut doc, &layout(), &CFG_GAMEPLAY, &installed(&["mine.json"])).unwrap();

        assert_eq!(
            doc.records(&["WorldsData"], "objectSpawnersArr").unwrap(),
            vec![json!("./custom/vanilla.json"), json!(7), json!("./custom/mine.json")]
        );
    }

    #[test]
    fn missing_worlds_data_is_an_error() {
        let mut doc = JsonDocument::parse(br#"{"GeneralData": {}}"#).unwrap();
        let err = register_installed(&mut doc, &layout(), &CFG_GAMEPLAY, &installed(&["a.json"]))
            .unwrap_err();
        assert_eq!(err, JsonShapeError::MissingKey("WorldsData".into()));
    }
}
