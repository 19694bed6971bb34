use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout string length {0} is not a perfect square")]
    NotSquare(usize),

    #[error("invalid character '{0}' in layout string at position {1}")]
    InvalidChar(char, usize),

    #[error("layout is not rotationally symmetric")]
    NotSymmetric,

    #[error("no valid border detected in layout")]
    NoBorder,

    #[error("invalid border: {0}")]
    InvalidBorder(String),
}

/// Failure to produce the bitmap for a single marker.
///
/// These never abort a render: the pattern draws a placeholder box in the
/// marker's place and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("marker ID {id} is out of range for {family} ({count} markers)")]
    IdOutOfRange { family: String, id: u32, count: usize },

    #[error("dictionary {dict} has no entry for marker ID {id}")]
    MissingId { dict: String, id: u32 },

    #[error("malformed marker matrix: {0}")]
    Malformed(String),

    #[error("marker ID {0} does not fit in 32 bits")]
    IdOverflow(u64),
}

/// Unrecognised name for one of the string-keyed option enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
