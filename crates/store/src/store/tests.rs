use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use vigil_primitives::{BlockPos, Compound, SectionPos, Tag};

use crate::{SectionStore, StoreConfig, StoreError, WorldSection};

/// Section holding named counters; the context is a multiplier applied on load.
#[derive(Debug, Default, PartialEq)]
struct CounterSection {
	pos: SectionPos,
	counters: BTreeMap<String, i32>,
}

impl WorldSection for CounterSection {
	type Context = i32;

	fn new(pos: SectionPos) -> Self {
		Self {
			pos,
			counters: BTreeMap::new(),
		}
	}

	fn pos(&self) -> SectionPos {
		self.pos
	}

	fn write_to_tag(&self, tag: &mut Compound) {
		for (name, value) in &self.counters {
			tag.put(name.as_str(), *value);
		}
	}

	fn read_from_tag(&mut self, tag: &Compound, scale: &i32) {
		self.counters = tag
			.iter()
			.filter_map(|(name, value)| match value {
				Tag::Int(v) => Some((name.to_owned(), v * scale)),
				_ => None,
			})
			.collect();
	}
}

fn bump(store: &SectionStore<CounterSection>, pos: BlockPos, name: &str) {
	store.write(|sections| {
		*sections.get_or_create(pos).counters.entry(name.to_owned()).or_default() += 1;
		sections.mark_dirty(pos);
	});
}

/// Sections are created on first write and never by reads.
#[test]
fn sections_are_created_lazily() {
	let store = SectionStore::<CounterSection>::chunked();
	let pos = BlockPos::new(-1, 40, 33);

	assert!(store.read(|sections| sections.get(pos).is_none()));
	assert_eq!(store.section_count(), 0);

	bump(&store, pos, "a");
	bump(&store, pos.offset(-15, 0, 0), "a");
	assert_eq!(store.section_count(), 1);
	assert_eq!(store.section_pos(pos), SectionPos::new(-1, 2));
	store.read(|sections| {
		let section = sections.get(pos).expect("section created by write");
		assert_eq!(section.pos(), SectionPos::new(-1, 2));
		assert_eq!(section.counters["a"], 2);
	});
}

/// Dirty tracking follows `mark_dirty` and is cleared by `take_dirty`.
#[test]
fn dirty_sections_are_tracked() {
	let store = SectionStore::<CounterSection>::chunked();
	bump(&store, BlockPos::new(40, 0, 0), "x");
	bump(&store, BlockPos::new(0, 0, 0), "x");
	store.write(|sections| {
		sections.get_or_create(BlockPos::new(100, 0, 100));
	});

	assert_eq!(store.dirty_sections(), vec![SectionPos::new(0, 0), SectionPos::new(2, 0)]);
	assert!(store.read(|sections| !sections.is_dirty(SectionPos::new(6, 6))));
	assert_eq!(store.take_dirty().len(), 2);
	assert!(store.dirty_sections().is_empty());
	assert_eq!(store.section_count(), 3);
}

/// Sections can be addressed by section coordinate, including coordinates
/// no block position maps to.
#[test]
fn section_addressed_access() {
	let store = SectionStore::<CounterSection>::chunked();
	let edge = SectionPos::new(134_217_728, -134_217_729);
	store.write(|sections| {
		assert!(sections.get_at(edge).is_none());
		*sections.get_or_create_at(edge).counters.entry("n".into()).or_default() += 1;
		sections.mark_dirty_at(edge);
	});

	assert_eq!(store.dirty_sections(), vec![edge]);
	store.read(|sections| {
		let section = sections.get_at(edge).expect("section created by write");
		assert_eq!(section.pos(), edge);
		assert_eq!(section.counters["n"], 1);
	});
	store.write(|sections| {
		sections.get_at_mut(edge).unwrap().counters.clear();
	});
	assert!(store.read(|sections| sections.get_at(edge).unwrap().counters.is_empty()));
}

/// Non-positive precision is rejected.
#[test]
fn invalid_precision() {
	assert!(matches!(
		SectionStore::<CounterSection>::new(0),
		Err(StoreError::InvalidConfig(_))
	));
	let store = SectionStore::<CounterSection>::new(512).unwrap();
	assert_eq!(store.section_pos(BlockPos::new(-1, 0, 511)), SectionPos::new(-1, 0));
}

/// The tree form lists sections in position order and reloads through the
/// section context.
#[test]
fn tag_round_trip_uses_context() {
	let store = SectionStore::<CounterSection>::chunked();
	bump(&store, BlockPos::new(20, 0, 0), "b");
	bump(&store, BlockPos::new(-20, 0, 0), "a");

	let root = store.write_to_tag();
	let xs: Vec<i32> = root
		.list("sections")
		.unwrap()
		.iter()
		.map(|entry| entry.as_compound().unwrap().get_int("sx").unwrap())
		.collect();
	assert_eq!(xs, vec![-2, 1]);

	let reloaded = SectionStore::<CounterSection>::chunked();
	reloaded.read_from_tag(&root, &10).unwrap();
	assert!(reloaded.dirty_sections().is_empty());
	reloaded.read(|sections| {
		assert_eq!(sections.get(BlockPos::new(-20, 0, 0)).unwrap().counters["a"], 10);
		assert_eq!(sections.get(BlockPos::new(20, 0, 0)).unwrap().counters["b"], 10);
	});
}

/// Entries without coordinates are skipped; a precision mismatch is an error.
#[test]
fn malformed_tree() {
	let mut root = SectionStore::<CounterSection>::chunked().write_to_tag();
	let mut entry = Compound::new();
	entry.put("sz", 3);
	root.put("sections", vec![Tag::Compound(entry), Tag::Int(1)]);

	let store = SectionStore::<CounterSection>::chunked();
	store.read_from_tag(&root, &1).unwrap();
	assert_eq!(store.section_count(), 0);

	root.put("precision", 512);
	assert!(matches!(
		store.read_from_tag(&root, &1),
		Err(StoreError::PrecisionMismatch {
			expected: 16,
			found: 512
		})
	));
}

/// Saving writes the data file atomically and clears the dirty set; loading
/// it into a fresh store reproduces the sections.
#[test]
fn save_and_load() {
	let dir = tempfile::tempdir().unwrap();
	let config = StoreConfig::persistent(dir.path().join("overworld"));

	let store = SectionStore::<CounterSection>::chunked();
	bump(&store, BlockPos::new(5, 0, 5), "hits");
	bump(&store, BlockPos::new(-300, 0, 70), "hits");

	let path = store.save(&config).unwrap().expect("persistent config writes a file");
	assert_eq!(path, dir.path().join("overworld").join("structure_matching.dat"));
	assert!(store.dirty_sections().is_empty());

	let loaded = SectionStore::<CounterSection>::chunked();
	assert!(loaded.load(&config, &1).unwrap());
	assert_eq!(loaded.write_to_tag(), store.write_to_tag());
}

/// In-memory configs and missing files are not errors.
#[test]
fn save_and_load_without_file() {
	let store = SectionStore::<CounterSection>::chunked();
	bump(&store, BlockPos::ORIGIN, "n");
	assert_eq!(store.save(&StoreConfig::in_memory()).unwrap(), None);
	assert_eq!(store.dirty_sections().len(), 1);

	let dir = tempfile::tempdir().unwrap();
	let config = StoreConfig::persistent(dir.path());
	assert!(!store.load(&config, &1).unwrap());
	assert_eq!(store.section_count(), 1);
}

/// Garbage on disk surfaces as a decode error.
#[test]
fn load_rejects_garbage() {
	let dir = tempfile::tempdir().unwrap();
	let config = StoreConfig::persistent(dir.path());
	std::fs::write(config.data_file().unwrap(), [0xff, 0xff, 0xff]).unwrap();
	let store = SectionStore::<CounterSection>::chunked();
	assert!(matches!(store.load(&config, &1), Err(StoreError::Decode(_))));
}

/// Concurrent writers never lose updates.
#[test]
fn concurrent_writes_are_serialized() {
	let store = Arc::new(SectionStore::<CounterSection>::chunked());
	std::thread::scope(|scope| {
		for t in 0..4 {
			let store = Arc::clone(&store);
			scope.spawn(move || {
				for i in 0..250 {
					bump(&store, BlockPos::new(i % 48, 0, t), "n");
				}
			});
		}
	});
	let total: i32 = store.read(|sections| sections.iter().map(|s| s.counters["n"]).sum());
	assert_eq!(total, 1000);
}
