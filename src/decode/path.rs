use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// The location of a value inside a response tree.
///
/// Displays as dotted field names with list indices in brackets, e.g.
/// `terraform.dependencies.dependencies[2].repo`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// A path of a single field.
    pub fn from_name(name: &str) -> FieldPath {
        FieldPath {
            segments: vec![Segment::Field(name.to_string())],
        }
    }

    /// This path extended by a field.
    pub fn field(&self, name: &str) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        FieldPath { segments }
    }

    /// This path extended by a list index.
    pub fn index(&self, index: usize) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if position == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
