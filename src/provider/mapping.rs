//! Declarative claim-mapping table and JSON path resolution.

// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{Claim, ClaimSet},
	error::ProfileError,
};

/// Errors raised while parsing JSON paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum JsonPathError {
	/// Paths cannot be empty.
	#[error("JSON path cannot be empty.")]
	Empty,
	/// A path segment was empty (`a..b` or a trailing dot).
	#[error("JSON path contains an empty segment: {path}.")]
	EmptySegment {
		/// The offending path.
		path: String,
	},
	/// An array index was not a valid number.
	#[error("JSON path contains an invalid array index: {path}.")]
	InvalidIndex {
		/// The offending path.
		path: String,
	},
	/// Brackets were unbalanced.
	#[error("JSON path contains unbalanced brackets: {path}.")]
	UnbalancedBrackets {
		/// The offending path.
		path: String,
	},
}

/// Single segment of a parsed [`JsonPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
	/// Object member lookup.
	Key(String),
	/// Array element lookup.
	Index(usize),
}

/// Parsed dotted/array-indexed path into a JSON document.
///
/// Segments are split on `.`; a `[n]` suffix indexes arrays and a bare numeric
/// segment is shorthand for the same, so `memberships[0].displayName` and
/// `memberships.0.displayName` resolve identically.
#[derive(Clone, PartialEq, Eq)]
pub struct JsonPath {
	raw: String,
	segments: Vec<PathSegment>,
}
impl JsonPath {
	/// Parses a dotted path.
	pub fn parse(path: impl AsRef<str>) -> Result<Self, JsonPathError> {
		let raw = path.as_ref();

		if raw.is_empty() {
			return Err(JsonPathError::Empty);
		}

		let mut segments = Vec::new();

		for piece in raw.split('.') {
			parse_piece(piece, raw, &mut segments)?;
		}

		Ok(Self { raw: raw.to_owned(), segments })
	}

	/// Raw textual form of the path.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Parsed segments in resolution order.
	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Resolves the path against a JSON document.
	pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
		let mut current = document;

		for segment in &self.segments {
			current = match segment {
				PathSegment::Key(key) => current.get(key.as_str())?,
				PathSegment::Index(index) => current.get(*index)?,
			};
		}

		Some(current)
	}
}
impl Debug for JsonPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("JsonPath").field(&self.raw).finish()
	}
}
impl Display for JsonPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.raw)
	}
}
impl FromStr for JsonPath {
	type Err = JsonPathError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Serialize for JsonPath {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for JsonPath {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		JsonPath::parse(raw).map_err(DeError::custom)
	}
}

fn parse_piece(
	piece: &str,
	path: &str,
	segments: &mut Vec<PathSegment>,
) -> Result<(), JsonPathError> {
	let (head, rest) = match piece.find('[') {
		Some(position) => (&piece[..position], &piece[position..]),
		None => (piece, ""),
	};

	if head.is_empty() && rest.is_empty() {
		return Err(JsonPathError::EmptySegment { path: path.to_owned() });
	}
	if !head.is_empty() {
		if head.bytes().all(|byte| byte.is_ascii_digit()) {
			let index = head
				.parse()
				.map_err(|_| JsonPathError::InvalidIndex { path: path.to_owned() })?;

			segments.push(PathSegment::Index(index));
		} else {
			segments.push(PathSegment::Key(head.to_owned()));
		}
	}

	let mut rest = rest;

	while !rest.is_empty() {
		let Some(stripped) = rest.strip_prefix('[') else {
			return Err(JsonPathError::UnbalancedBrackets { path: path.to_owned() });
		};
		let Some(end) = stripped.find(']') else {
			return Err(JsonPathError::UnbalancedBrackets { path: path.to_owned() });
		};
		let index = stripped[..end]
			.parse()
			.map_err(|_| JsonPathError::InvalidIndex { path: path.to_owned() })?;

		segments.push(PathSegment::Index(index));

		rest = &stripped[end + 1..];
	}

	Ok(())
}

/// One entry of the claim-mapping table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMapping {
	/// Source path into the user-info JSON body.
	pub path: JsonPath,
	/// Destination claim name.
	pub claim: String,
	/// Fails the login when the source value is missing.
	pub required: bool,
}
impl ClaimMapping {
	/// Creates an optional mapping from a JSON path to a claim name.
	pub fn new(path: impl AsRef<str>, claim: impl Into<String>) -> Result<Self, JsonPathError> {
		Ok(Self { path: JsonPath::parse(path)?, claim: claim.into(), required: false })
	}

	/// Marks the mapping as required.
	pub fn required(mut self) -> Self {
		self.required = true;

		self
	}
}

/// Projects the user-info document through the mapping table, in table order.
///
/// A missing or `null` source value is skipped unless the mapping is required.
pub(crate) fn project_claims(
	mappings: &[ClaimMapping],
	document: &Value,
) -> Result<ClaimSet, ProfileError> {
	let mut claims = ClaimSet::new();

	for mapping in mappings {
		match mapping.path.resolve(document).filter(|value| !value.is_null()) {
			Some(value) => claims.push(Claim::new(mapping.claim.clone(), render_value(value))),
			None if mapping.required =>
				return Err(ProfileError::MissingRequiredClaim {
					path: mapping.path.as_str().to_owned(),
					claim: mapping.claim.clone(),
				}),
			None => {},
		}
	}

	Ok(claims)
}

fn render_value(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}
