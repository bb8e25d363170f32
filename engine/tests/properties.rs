//! Property tests: every profile is idempotent and never loses installed keys.

use modmerge_engine::format::XmlDocument;
use modmerge_engine::{
    key, run, MergeResult, Source, CFG_GAMEPLAY, MAP_GROUP_POS, MAP_GROUP_PROTO,
    SPAWNABLE_TYPES, UNDERGROUND_TRIGGERS,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

/// (name, pos, payload) triples rendered as root children.
fn entries() -> impl Strategy<Value = Vec<(String, String, u8)>> {
    prop::collection::vec(("[A-D][a-c]{0,2}", "[0-2] [0-2] 0", 0u8..3), 0..8)
}

fn xml(root: &str, entries: &[(String, String, u8)]) -> String {
    let mut out = format!("<{root}>");
    for (name, pos, payload) in entries {
        out.push_str(&format!(
            r#"<group name="{name}" pos="{pos}"><usage n="{payload}"/></group>"#
        ));
    }
    out.push_str(&format!("</{root}>"));
    out
}

fn merged_or_target(result: MergeResult, target: &[u8]) -> Vec<u8> {
    result.into_content().unwrap_or_else(|| target.to_vec())
}

proptest! {
    #[test]
    fn xml_profiles_are_idempotent(target in entries(), source in entries()) {
        for profile in [&MAP_GROUP_POS, &MAP_GROUP_PROTO, &SPAWNABLE_TYPES] {
            let target = xml("root", &target);
            let source = xml("root", &source);

            let first = run(target.as_bytes(), Source::Fragment(source.as_bytes()), profile).unwrap();
            let merged = merged_or_target(first, target.as_bytes());
            let second = run(&merged, Source::Fragment(source.as_bytes()), profile).unwrap();
            prop_assert_eq!(second, MergeResult::Unchanged);
        }
    }

    #[test]
    fn xml_merges_keep_every_key(target in entries(), source in entries()) {
        for profile in [&MAP_GROUP_POS, &MAP_GROUP_PROTO, &SPAWNABLE_TYPES] {
            let target = xml("root", &target);
            let source = xml("root", &source);

            let keys = |bytes: &[u8]| -> HashSet<_> {
                XmlDocument::parse(bytes)
                    .unwrap()
                    .root
                    .children
                    .iter()
                    .filter_map(|node| key(node, profile))
                    .collect()
            };

            let result = run(target.as_bytes(), Source::Fragment(source.as_bytes()), profile).unwrap();
            let merged = merged_or_target(result, target.as_bytes());
            let merged_keys = keys(&merged);
            let expected: HashSet<_> = keys(target.as_bytes())
                .union(&keys(source.as_bytes()))
                .cloned()
                .collect();
            prop_assert_eq!(merged_keys, expected);
        }
    }

    #[test]
    fn triggers_are_idempotent(
        target in prop::collection::vec((0i32..3, 0i32..3), 0..6),
        source in prop::collection::vec((0i32..3, 0i32..3), 0..6),
    ) {
        let render = |items: &[(i32, i32)]| {
            let triggers: Vec<_> = items
                .iter()
                .map(|(x, size)| json!({"Position": [x, 0, 0], "Size": [size, size, size]}))
                .collect();
            json!({ "Triggers": triggers }).to_string()
        };
        let target = render(&target);
        let source = render(&source);

        let first = run(target.as_bytes(), Source::Fragment(source.as_bytes()), &UNDERGROUND_TRIGGERS).unwrap();
        let merged = merged_or_target(first, target.as_bytes());
        let second = run(&merged, Source::Fragment(source.as_bytes()), &UNDERGROUND_TRIGGERS).unwrap();
        prop_assert_eq!(second, MergeResult::Unchanged);
    }

    #[test]
    fn gameplay_is_idempotent(installed in prop::collection::vec("[a-c]{1,3}(-pra|-PRA)?\\.json", 0..6)) {
        let target = br#"{"WorldsData": {"objectSpawnersArr": ["./custom/a.json"]}}"#;

        let first = run(target, Source::InstalledFiles(&installed), &CFG_GAMEPLAY).unwrap();
        let distinct: HashSet<_> = installed.iter().filter(|f| f.as_str() != "a.json").collect();
        prop_assert_eq!(first.change_count(), distinct.len());

        let merged = merged_or_target(first, target);
        let second = run(&merged, Source::InstalledFiles(&installed), &CFG_GAMEPLAY).unwrap();
        prop_assert_eq!(second, MergeResult::Unchanged);
    }
}
