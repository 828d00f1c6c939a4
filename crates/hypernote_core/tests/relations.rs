use hypernote_core::codec;
use hypernote_core::{Relation, RelationQuery, RelationRole, RelationStore, RegistryError};
use std::fs;

fn sample_store() -> RelationStore {
    let mut store = RelationStore::new();
    store.add(Relation::paired(1, RelationRole::Used, 2));
    store.add(Relation::paired(3, RelationRole::Created, 1));
    store.add(Relation::paired(3, RelationRole::Before, 4));
    store.add(Relation::paired(1, RelationRole::Used, 2));
    store
}

#[test]
fn one_endpoint_query_matches_either_side() {
    let store = sample_store();
    let hits: Vec<&Relation> = store.get(RelationQuery::One(1)).collect();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|relation| relation.involves(1)));
    assert_eq!(store.get(RelationQuery::One(99)).count(), 0);
}

#[test]
fn two_endpoint_query_matches_both_orders() {
    let store = sample_store();
    assert_eq!(store.get(RelationQuery::Both(2, 1)).count(), 2);
    assert_eq!(store.get(RelationQuery::Both(1, 3)).count(), 1);
    assert_eq!(store.get(RelationQuery::Both(2, 4)).count(), 0);
}

#[test]
fn repeated_id_in_two_endpoint_query_matches_any_relation_naming_it() {
    let store = sample_store();
    assert_eq!(
        store.get(RelationQuery::Both(1, 1)).count(),
        store.get(RelationQuery::One(1)).count()
    );
    assert_eq!(store.get(RelationQuery::Both(1, 1)).count(), 3);
    assert_eq!(store.get(RelationQuery::Both(4, 4)).count(), 1);
    assert_eq!(store.get(RelationQuery::Both(99, 99)).count(), 0);
}

#[test]
fn relation_file_roundtrip_keeps_order_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".hnote.relations");
    let store = sample_store();
    store.save(Some(&path)).unwrap();

    let loaded = RelationStore::load(Some(&path)).unwrap();
    let original: Vec<&Relation> = store.iter().collect();
    let reloaded: Vec<&Relation> = loaded.iter().collect();
    assert_eq!(original, reloaded);
}

#[test]
fn missing_relation_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = RelationStore::load(Some(&dir.path().join("none"))).unwrap();
    assert!(store.is_empty());
}

#[test]
fn unknown_role_code_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.relations");
    let mut bytes = Vec::new();
    codec::wire::write_header(&mut bytes, b'R', 1);
    for value in [1_i32, 2, 0, 17] {
        codec::encode_into(value, &mut bytes).unwrap();
    }
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        RelationStore::load(Some(&path)),
        Err(RegistryError::Codec(codec::CodecError::InvalidValue { .. }))
    ));
}
