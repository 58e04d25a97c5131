//! Core type definitions for graphsync.

use std::fmt;

/// Side of a DTO/Entity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The flat, transfer-oriented graph.
    Dto,
    /// The rich domain graph.
    Entity,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Dto => Self::Entity,
            Self::Entity => Self::Dto,
        }
    }

    /// Indefinite article for the side name.
    #[must_use]
    pub const fn article(self) -> &'static str {
        match self {
            Self::Dto => "a",
            Self::Entity => "an",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dto => f.write_str("dto"),
            Self::Entity => f.write_str("entity"),
        }
    }
}

/// Prefix that marks an entity field as virtual: the binding reads the
/// entity itself and never writes it.
pub const VIRTUAL_PREFIX: &str = "#this#";

/// Separator between hops of a chained entity field.
pub const PATH_SEPARATOR: char = '.';
