use serde::{Deserialize, Serialize};

/// A single (head, relation, tail) fact returned by the extraction service.
///
/// The service names the relation `type`; that is kept on the wire and in
/// exported documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub head: String,
    #[serde(rename = "type")]
    pub relation: String,
    pub tail: String,
}

impl Triplet {
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

/// Generation settings sent alongside the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParameters {
    pub beam_count: u32,
    pub max_output_length: u32,
    pub length_penalty: f64,
    pub sequence_count: u32,
}

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Triplets(Vec<Triplet>),
    /// The service answered but had no triplets for the text.
    Empty,
}

impl ExtractionOutcome {
    pub fn from_triplets(triplets: Option<Vec<Triplet>>) -> Self {
        match triplets {
            Some(triplets) if !triplets.is_empty() => Self::Triplets(triplets),
            _ => Self::Empty,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Triplets(triplets) => triplets.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
