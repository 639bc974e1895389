//! Structured persistence tree.
//!
//! # Role
//!
//! Sections and observers persist themselves as a tree of named fields rather
//! than as a fixed struct layout, so observer kinds can evolve their own state
//! independently of the registry. The tree is serde-serializable; the store
//! encodes it with `postcard`.
//!
//! # Lenient reads
//!
//! Typed getters return [`TagError`] for missing or mistyped fields. Callers
//! that want the forgiving behaviour of older save formats use the `*_or`
//! variants, which fall back to a default.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pos::BlockPos;


/// Discriminant of a [`Tag`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
	Byte,
	Int,
	Long,
	Double,
	String,
	List,
	Compound,
}

impl fmt::Display for TagKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TagKind::Byte => "byte",
			TagKind::Int => "int",
			TagKind::Long => "long",
			TagKind::Double => "double",
			TagKind::String => "string",
			TagKind::List => "list",
			TagKind::Compound => "compound",
		};
		f.write_str(name)
	}
}

/// Failure reading a required field from a [`Compound`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
	#[error("missing field {0:?}")]
	Missing(String),
	#[error("field {field:?} is a {found}, expected {expected}")]
	WrongKind {
		field: String,
		expected: TagKind,
		found: TagKind,
	},
}

/// One node of the persistence tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tag {
	Byte(i8),
	Int(i32),
	Long(i64),
	Double(f64),
	String(String),
	List(Vec<Tag>),
	Compound(Compound),
}

impl Tag {
	pub fn kind(&self) -> TagKind {
		match self {
			Tag::Byte(_) => TagKind::Byte,
			Tag::Int(_) => TagKind::Int,
			Tag::Long(_) => TagKind::Long,
			Tag::Double(_) => TagKind::Double,
			Tag::String(_) => TagKind::String,
			Tag::List(_) => TagKind::List,
			Tag::Compound(_) => TagKind::Compound,
		}
	}

	pub fn as_compound(&self) -> Option<&Compound> {
		match self {
			Tag::Compound(c) => Some(c),
			_ => None,
		}
	}
}

impl From<Compound> for Tag {
	fn from(value: Compound) -> Self {
		Tag::Compound(value)
	}
}

impl From<Vec<Tag>> for Tag {
	fn from(value: Vec<Tag>) -> Self {
		Tag::List(value)
	}
}

impl From<String> for Tag {
	fn from(value: String) -> Self {
		Tag::String(value)
	}
}

impl From<&str> for Tag {
	fn from(value: &str) -> Self {
		Tag::String(value.to_owned())
	}
}

impl From<i32> for Tag {
	fn from(value: i32) -> Self {
		Tag::Int(value)
	}
}

impl From<i64> for Tag {
	fn from(value: i64) -> Self {
		Tag::Long(value)
	}
}

impl From<f64> for Tag {
	fn from(value: f64) -> Self {
		Tag::Double(value)
	}
}

impl From<bool> for Tag {
	fn from(value: bool) -> Self {
		Tag::Byte(value as i8)
	}
}

/// A map of named [`Tag`]s with deterministic (sorted) field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Compound {
	fields: BTreeMap<String, Tag>,
}

macro_rules! typed_getter {
	($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
		$(#[$doc])*
		pub fn $name(&self, field: &str) -> Result<$ty, TagError> {
			match self.require(field)? {
				Tag::$variant(v) => Ok(v.clone()),
				other => Err(TagError::WrongKind {
					field: field.to_owned(),
					expected: TagKind::$variant,
					found: other.kind(),
				}),
			}
		}
	};
}

impl Compound {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn get(&self, field: &str) -> Option<&Tag> {
		self.fields.get(field)
	}

	/// Inserts or replaces a field, returning the previous value.
	pub fn put(&mut self, field: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
		self.fields.insert(field.into(), tag.into())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	fn require(&self, field: &str) -> Result<&Tag, TagError> {
		self.fields.get(field).ok_or_else(|| TagError::Missing(field.to_owned()))
	}

	typed_getter!(get_byte, Byte, i8);
	typed_getter!(get_int, Int, i32);
	typed_getter!(
		/// Returns a clone of a list field.
		get_list,
		List,
		Vec<Tag>
	);

	/// Borrows a list field without cloning it.
	pub fn list(&self, field: &str) -> Result<&[Tag], TagError> {
		match self.require(field)? {
			Tag::List(items) => Ok(items),
			other => Err(TagError::WrongKind {
				field: field.to_owned(),
				expected: TagKind::List,
				found: other.kind(),
			}),
		}
	}

	/// Borrows a compound field.
	pub fn compound(&self, field: &str) -> Result<&Compound, TagError> {
		match self.require(field)? {
			Tag::Compound(c) => Ok(c),
			other => Err(TagError::WrongKind {
				field: field.to_owned(),
				expected: TagKind::Compound,
				found: other.kind(),
			}),
		}
	}

	/// Borrows a string field.
	pub fn str(&self, field: &str) -> Result<&str, TagError> {
		match self.require(field)? {
			Tag::String(s) => Ok(s),
			other => Err(TagError::WrongKind {
				field: field.to_owned(),
				expected: TagKind::String,
				found: other.kind(),
			}),
		}
	}

	/// Reads a boolean stored as a byte (non-zero is `true`).
	pub fn get_bool(&self, field: &str) -> Result<bool, TagError> {
		self.get_byte(field).map(|b| b != 0)
	}

	pub fn get_int_or(&self, field: &str, default: i32) -> i32 {
		self.get_int(field).unwrap_or(default)
	}

	pub fn get_bool_or(&self, field: &str, default: bool) -> bool {
		self.get_bool(field).unwrap_or(default)
	}

	/// Returns the named compound, or an empty one if absent or mistyped.
	pub fn compound_or_empty(&self, field: &str) -> Compound {
		self.compound(field).cloned().unwrap_or_default()
	}

	/// Builds a nested compound with `build` and stores it under `field`.
	pub fn set_sub_tag(&mut self, field: impl Into<String>, build: impl FnOnce(&mut Compound)) {
		let mut sub = Compound::new();
		build(&mut sub);
		self.put(field, sub);
	}

	/// Stores `pos` as the `x`, `y` and `z` int fields.
	pub fn write_block_pos(&mut self, pos: BlockPos) {
		self.put("x", pos.x);
		self.put("y", pos.y);
		self.put("z", pos.z);
	}

	/// Reads a position written by [`Compound::write_block_pos`].
	pub fn read_block_pos(&self) -> Result<BlockPos, TagError> {
		Ok(BlockPos::new(self.get_int("x")?, self.get_int("y")?, self.get_int("z")?))
	}
}

impl FromIterator<(String, Tag)> for Compound {
	fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
		Self {
			fields: iter.into_iter().collect(),
		}
	}
}
