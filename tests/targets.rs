use std::sync::Arc;

use indexmap::IndexMap;

use plugin_updater::update::target::{TargetMap, TargetOrigin, TargetRegistry, TargetSet, TargetSource};

fn map(entries: &[(&str, &str)]) -> TargetMap {
    entries
        .iter()
        .map(|(name, owner)| (name.to_string(), TargetSource::new(owner, "repo", None)))
        .collect()
}

#[test]
fn file_entries_win_over_dynamic_entries() {
    let merged = TargetSet::merge(&map(&[("A", "X")]), &map(&[("A", "Y"), ("B", "Z")]));

    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get("A").unwrap().source.owner, "Y");
    assert_eq!(merged.get("A").unwrap().origin, TargetOrigin::File);
    assert_eq!(merged.get("B").unwrap().source.owner, "Z");
}

#[test]
fn name_collision_is_case_insensitive() {
    let merged = TargetSet::merge(&map(&[("a", "X")]), &map(&[("A", "Y")]));

    let targets: Vec<_> = merged.into_iter().collect();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].name, "A");
    assert_eq!(targets[0].source.owner, "Y");
}

#[test]
fn merge_of_empty_maps_is_empty() {
    assert!(TargetSet::merge(&IndexMap::new(), &IndexMap::new()).is_empty());
}

#[test]
fn registrations_from_many_threads_are_all_kept() {
    let registry = Arc::new(TargetRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.register(&format!("Plugin{}", i), "owner", "repo", None)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    assert_eq!(registry.len(), 8);
    let merged = TargetSet::merge(&registry.snapshot(), &IndexMap::new());
    assert!(merged.iter().all(|t| t.origin == TargetOrigin::Integration));
}
