//! Structural data types and the exchangeable sets built from them.
//!
//! A [`DataType`] names a structural shape that can be projected into the
//! target type system. Source types map onto data types through the
//! [`StructuralTypes`] collaborator, which also supplies the maximal
//! exchangeable universe.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::SourceType;

/// A structural type reference with its nullability.
///
/// Serialized as the shape name, with a trailing `?` when nullable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataType {
    name: String,
    nullable: bool,
}

impl DataType {
    /// Non-nullable reference to a shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
        }
    }

    /// Shape name, without the nullable suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this reference was written with a `?` suffix.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The nullable counterpart.
    pub fn nullable(&self) -> Self {
        Self {
            name: self.name.clone(),
            nullable: true,
        }
    }

    /// The non-nullable counterpart.
    pub fn non_nullable(&self) -> Self {
        Self {
            name: self.name.clone(),
            nullable: false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (name, nullable) = match value.strip_suffix('?') {
            Some(name) => (name, true),
            None => (value.as_str(), false),
        };
        if name.trim().is_empty() {
            return Err(format!("invalid data type reference '{}'", value));
        }
        Ok(Self {
            name: name.to_string(),
            nullable,
        })
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string()
    }
}

/// A named field of a record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldShape {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DataType,
}

/// The structure behind a data type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataShape {
    /// A leaf value (string, number, ...).
    Primitive,
    /// A record with named fields.
    Record { fields: Vec<FieldShape> },
    /// A union of other shapes.
    Union { members: Vec<DataType> },
    /// A closed set of literal values.
    Enumeration { values: Vec<String> },
    /// A homogeneous list.
    List { element: DataType },
}

impl DataShape {
    /// Data types this shape refers to directly.
    pub fn references(&self) -> Vec<DataType> {
        match self {
            DataShape::Primitive | DataShape::Enumeration { .. } => Vec::new(),
            DataShape::Record { fields } => fields.iter().map(|f| f.ty.clone()).collect(),
            DataShape::Union { members } => members.clone(),
            DataShape::List { element } => vec![element.clone()],
        }
    }
}

/// The structural type system consumed by the registration passes.
pub trait StructuralTypes {
    /// The data type a source type maps to, if it is structural at all.
    fn find_by_type(&self, source: &SourceType) -> Option<DataType>;

    /// The maximal set of data types allowed across the boundary.
    fn universe(&self) -> &ExchangeableSet;

    /// Data types directly referenced by the shape behind `data_type`.
    fn references(&self, data_type: &DataType) -> Vec<DataType>;

    /// The source type that owns a data type, if any.
    fn owner_of(&self, data_type: &DataType) -> Option<SourceType>;

    /// The non-nullable counterpart of a data type.
    fn non_nullable(&self, data_type: &DataType) -> DataType {
        data_type.non_nullable()
    }

    /// Whether the non-nullable form of `data_type` is in the universe.
    fn is_exchangeable(&self, data_type: &DataType) -> bool {
        self.universe().contains(&self.non_nullable(data_type))
    }
}

/// An in-memory structural type system.
#[derive(Debug, Clone, Default)]
pub struct StructuralCatalog {
    shapes: HashMap<String, DataShape>,
    by_source: HashMap<SourceType, DataType>,
    owners: HashMap<String, SourceType>,
    universe: ExchangeableSet,
}

impl StructuralCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the common exchangeable primitives.
    pub fn with_primitives() -> Self {
        let mut catalog = Self::new();
        for name in ["string", "int", "float", "bool"] {
            catalog.define(name, DataShape::Primitive, true);
        }
        catalog
    }

    /// Define a shape. Exchangeable shapes join the universe.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        shape: DataShape,
        exchangeable: bool,
    ) -> &mut Self {
        let name = name.into();
        if exchangeable {
            self.universe.insert(DataType::new(name.clone()));
        }
        self.shapes.insert(name, shape);
        self
    }

    /// Map a source type onto a data type.
    pub fn bind(&mut self, source: SourceType, data_type: DataType) -> &mut Self {
        self.owners.insert(data_type.name().to_string(), source.clone());
        self.by_source.insert(source, data_type);
        self
    }

    /// Shape behind a data type name.
    pub fn shape(&self, name: &str) -> Option<&DataShape> {
        self.shapes.get(name)
    }
}

impl StructuralTypes for StructuralCatalog {
    fn find_by_type(&self, source: &SourceType) -> Option<DataType> {
        self.by_source.get(source).cloned()
    }

    fn universe(&self) -> &ExchangeableSet {
        &self.universe
    }

    fn references(&self, data_type: &DataType) -> Vec<DataType> {
        self.shapes
            .get(data_type.name())
            .map(DataShape::references)
            .unwrap_or_default()
    }

    fn owner_of(&self, data_type: &DataType) -> Option<SourceType> {
        self.owners.get(data_type.name()).cloned()
    }
}

/// A set of non-nullable data types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeableSet {
    types: BTreeSet<DataType>,
}

impl ExchangeableSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a data type, normalized to its non-nullable form.
    pub fn insert(&mut self, data_type: DataType) -> bool {
        self.types.insert(data_type.non_nullable())
    }

    /// Membership test, ignoring nullability.
    pub fn contains(&self, data_type: &DataType) -> bool {
        if data_type.is_nullable() {
            self.types.contains(&data_type.non_nullable())
        } else {
            self.types.contains(data_type)
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataType> {
        self.types.iter()
    }

    /// True when every member is also in `other`.
    pub fn is_subset(&self, other: &ExchangeableSet) -> bool {
        self.types.is_subset(&other.types)
    }

    /// Extend this set with `include`, closed over structural references.
    ///
    /// Only members of the universe supplied by `types` are ever added, and
    /// excluded types are neither added nor traversed.
    pub fn include_and_exclude<I>(
        &self,
        include: I,
        exclude: &ExchangeableSet,
        types: &dyn StructuralTypes,
    ) -> ExchangeableSet
    where
        I: IntoIterator<Item = DataType>,
    {
        let universe = types.universe();
        let mut result = self.clone();
        let mut queue: VecDeque<DataType> = include
            .into_iter()
            .map(|dt| types.non_nullable(&dt))
            .collect();

        while let Some(next) = queue.pop_front() {
            if exclude.contains(&next) || !universe.contains(&next) || result.contains(&next) {
                continue;
            }
            for reference in types.references(&next) {
                queue.push_back(types.non_nullable(&reference));
            }
            result.insert(next);
        }

        result
    }
}

impl FromIterator<DataType> for ExchangeableSet {
    fn from_iter<T: IntoIterator<Item = DataType>>(iter: T) -> Self {
        let mut set = Self::empty();
        for dt in iter {
            set.insert(dt);
        }
        set
    }
}
