use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("A rigid site must contain at least one atom")]
    EmptySite,

    #[error("Flat coordinate array of length {len} is not a multiple of 3")]
    FlatCoordinateLength { len: usize },

    #[error("Site has {expected} atoms but {found} atom indices were given")]
    AtomIndexCount { expected: usize, found: usize },

    #[error("Atom index {index} appears more than once within a single site")]
    DuplicateAtomIndex { index: usize },

    #[error("Cannot finalize a topology without any sites")]
    Empty,

    #[error("Site {site} claims atom index {index}, but the topology only has {total_atoms} atoms")]
    IndexOutOfRange {
        site: usize,
        index: usize,
        total_atoms: usize,
    },

    #[error("Atom index {index} is claimed by both site {first_site} and site {second_site}")]
    OverlappingAtomIndex {
        index: usize,
        first_site: usize,
        second_site: usize,
    },

    #[error("Expected a rigid-body coordinate array of length {expected}, got {found}")]
    CoordinateLength { expected: usize, found: usize },

    #[error("Expected an atomistic gradient array of length {expected}, got {found}")]
    GradientLength { expected: usize, found: usize },
}
