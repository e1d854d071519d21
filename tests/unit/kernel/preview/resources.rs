use super::*;
use crate::kernel::services::adapters::MemoryBlobStore;

fn set_with(blobs: &MemoryBlobStore, generation: u64, paths: &[&str]) -> BindingSet {
    let mut set = BindingSet::new(generation);
    for path in paths {
        set.bind(blobs, path, "text/css", "body {}");
    }
    set
}

#[test]
fn test_complete_revokes_previous_generation() {
    let blobs = MemoryBlobStore::new();
    let mut registry = ResourceRegistry::new();

    let first = registry.begin();
    assert!(registry.complete(set_with(&blobs, first, &["a.css", "b.css"]), &blobs));
    assert_eq!(blobs.live_count(), 2);

    let second = registry.begin();
    assert!(registry.complete(set_with(&blobs, second, &["a.css"]), &blobs));

    assert_eq!(blobs.live_count(), 1);
    assert_eq!(registry.completed_generation(), second);
    assert_eq!(registry.live().map(|s| s.generation()), Some(second));
}

#[test]
fn test_late_completion_is_discarded() {
    let blobs = MemoryBlobStore::new();
    let mut registry = ResourceRegistry::new();

    let older = registry.begin();
    let newer = registry.begin();
    assert!(registry.complete(set_with(&blobs, newer, &["new.css"]), &blobs));

    let late = set_with(&blobs, older, &["old.css"]);
    let late_uri = late.uris()["old.css"].clone();
    assert!(!registry.complete(late, &blobs));

    assert!(blobs.read(&late_uri).is_none());
    assert_eq!(blobs.live_count(), 1);
    assert_eq!(registry.completed_generation(), newer);
}

#[test]
fn test_rebinding_same_path_revokes_old_uri() {
    let blobs = MemoryBlobStore::new();
    let mut set = BindingSet::new(1);
    set.bind(&blobs, "a.js", "application/javascript", "1");
    set.bind(&blobs, "a.js", "application/javascript", "2");

    assert_eq!(set.len(), 1);
    assert_eq!(blobs.live_count(), 1);
}

#[test]
fn test_release_drops_everything() {
    let blobs = MemoryBlobStore::new();
    let mut registry = ResourceRegistry::new();
    let generation = registry.begin();
    registry.complete(set_with(&blobs, generation, &["a.css", "b.css"]), &blobs);

    registry.release(&blobs);

    assert_eq!(blobs.live_count(), 0);
    assert!(registry.live().is_none());
}
