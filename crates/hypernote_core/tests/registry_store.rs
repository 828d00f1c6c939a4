use hypernote_core::codec::{self, wire};
use hypernote_core::{
    create_note, AutofillSource, CreationContext, LinkResolver, LinkedText, Note, NoteId, NoteKind,
    NoteRegistry, RawValues, RegistryError,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

struct Fixed;

impl AutofillSource for Fixed {
    fn detect_version(&self, _cmd: &str) -> Option<String> {
        None
    }

    fn timestamp(&self) -> String {
        "2018-01-01T00:00:00Z".into()
    }
}

fn build(
    kind: NoteKind,
    uid: NoteId,
    pairs: &[(&str, &str)],
    resolver: &dyn LinkResolver,
) -> Note {
    let raw: RawValues = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let ctx = CreationContext {
        resolver,
        autofill: &Fixed,
        base_dir: Path::new("/nb"),
        cwd: Path::new("/nb"),
    };
    create_note(kind, uid, &raw, &ctx).unwrap().note().clone()
}

fn sample_registry() -> NoteRegistry {
    let mut registry = NoteRegistry::new();
    let tool = build(NoteKind::Tool, 10, &[("cmd", "samtools")], &registry);
    registry.add(tool).unwrap();
    let data = build(NoteKind::Data, 20, &[("path", "reads/x.bam")], &registry);
    registry.add(data).unwrap();
    let action = build(
        NoteKind::Action,
        30,
        &[
            ("shellcmd", "samtools view x.bam"),
            ("desc", "peek at x.bam with samtools"),
        ],
        &registry,
    );
    registry.add(action).unwrap();
    registry
}

#[test]
fn duplicate_searchable_text_is_rejected_case_insensitively() {
    let mut registry = sample_registry();
    let before = registry.index().len();
    let clash = build(
        NoteKind::Tool,
        40,
        &[("name", "fresh"), ("cmd", "SAMTOOLS")],
        &registry,
    );

    let err = registry.add(clash).unwrap_err();
    let RegistryError::DuplicateSearchable {
        field, existing, ..
    } = err
    else {
        panic!("expected duplicate searchable, got {err:?}");
    };
    assert_eq!(field, "cmd");
    assert_eq!(existing, 10);

    // Rejected note leaves no trace, including its non-clashing name.
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.index().len(), before);
    assert!(registry.search("fresh").is_empty());
    assert!(!registry.contains(40));
}

#[test]
fn search_is_exact_and_case_insensitive() {
    let registry = sample_registry();
    assert_eq!(registry.search("SamTools"), vec![10]);
    assert_eq!(registry.search("x.bam"), vec![20]);
    assert!(registry.search("sam").is_empty());
    assert!(registry.search("").is_empty());
}

#[test]
fn autolinks_point_at_registered_notes() {
    let registry = sample_registry();
    let Note::Action(action) = registry.get(30).unwrap() else {
        panic!("expected action note");
    };
    let dests: Vec<NoteId> = action.desc().links().iter().map(|link| link.dest).collect();
    assert_eq!(dests, vec![20, 10]);
    assert_eq!(action.shellcmd().links().len(), 2);
}

/// Counts 32-bit words pulled from the wrapped generator.
struct CountingRng<R> {
    inner: R,
    words: usize,
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.words += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.words += 2;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.words += dest.len().div_ceil(4);
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.words += dest.len().div_ceil(4);
        self.inner.try_fill_bytes(dest)
    }
}

#[test]
fn gen_uid_never_returns_a_used_id() {
    const DRAWS: usize = 200;
    let mut registry = NoteRegistry::new();
    let mut rng = CountingRng {
        inner: StdRng::seed_from_u64(0x5eed),
        words: 0,
    };
    let mut seen = HashSet::new();
    for i in 0..DRAWS {
        let before = rng.words;
        let uid = registry.gen_uid_with(&mut rng);
        // A sparse registry almost never collides; runaway resampling would.
        assert!(rng.words - before <= 64, "draw {i} used {} words", rng.words - before);
        assert!(uid >= 0);
        assert!(seen.insert(uid));
        let note = build(
            NoteKind::Tool,
            uid,
            &[("cmd", format!("tool-{i}").as_str())],
            &registry,
        );
        registry.add(note).unwrap();
    }
    assert!(rng.words <= 8 * DRAWS, "{} words for {DRAWS} ids", rng.words);
    assert!(!registry.contains(registry.gen_uid()));
}

#[test]
fn save_and_load_preserve_notes_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".hnote");
    let registry = sample_registry();
    registry.save(Some(&path)).unwrap();

    let loaded = NoteRegistry::load(Some(&path)).unwrap();
    let original: Vec<&Note> = registry.iter().collect();
    let reloaded: Vec<&Note> = loaded.iter().collect();
    assert_eq!(original, reloaded);
    assert_eq!(loaded.search("samtools"), vec![10]);
    assert_eq!(loaded.index().len(), registry.index().len());
}

#[test]
fn empty_registry_saves_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".hnote");
    NoteRegistry::new().save(Some(&path)).unwrap();
    assert_eq!(fs::read(&path).unwrap().len(), 0);
    assert!(NoteRegistry::load(Some(&path)).unwrap().is_empty());
}

#[test]
fn missing_file_and_no_path_load_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(NoteRegistry::load(Some(&dir.path().join("absent")))
        .unwrap()
        .is_empty());
    assert!(NoteRegistry::load(None).unwrap().is_empty());
    NoteRegistry::new().save(None).unwrap();
}

#[test]
fn corrupt_file_fails_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".hnote");
    let mut bytes = sample_registry().to_bytes().unwrap();
    bytes.truncate(bytes.len() - 3);
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        NoteRegistry::load(Some(&path)),
        Err(RegistryError::Codec(_))
    ));
}

#[test]
fn legacy_records_get_fresh_ids() {
    let mut bytes = sample_registry().to_bytes().unwrap();
    wire::write_header(&mut bytes, b'D', 1);
    codec::encode_into("old.txt", &mut bytes).unwrap();
    codec::encode_into("/archive/old.txt", &mut bytes).unwrap();
    codec::encode_into(&LinkedText::default(), &mut bytes).unwrap();
    codec::encode_into(&LinkedText::default(), &mut bytes).unwrap();

    let registry = NoteRegistry::from_bytes(&bytes).unwrap();
    assert_eq!(registry.len(), 4);
    let uid = registry.search("old.txt")[0];
    assert!(uid >= 0);
    assert!(![10, 20, 30].contains(&uid));
}

#[test]
fn non_note_record_is_rejected() {
    let bytes = codec::encode(5_i32).unwrap();
    assert!(matches!(
        NoteRegistry::from_bytes(&bytes),
        Err(RegistryError::UnexpectedRecord { .. })
    ));
}

#[test]
fn notes_serialize_with_kind_tag() {
    let registry = sample_registry();
    let json = serde_json::to_value(registry.get(20).unwrap()).unwrap();
    assert_eq!(json["kind"], "data");
    assert_eq!(json["name"], "x.bam");
    assert_eq!(json["path"], "reads/x.bam");
    assert_eq!(json["uid"], 20);
}
