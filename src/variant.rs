//! Named variants.
//!
//! A request may name a variant (`?variant=preview`). Names map onto a
//! closed set of transforms; every name outside the set, and the absence of
//! a name, is the identity transform. An unknown name is never an error.
//!
//! | Name | Transform | Derived-file token |
//! |---|---|---|
//! | `preview` | aspect-preserving resize to the configured long edge | `preview` |
//! | *(none / anything else)* | identity | `original` |

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Pixels unchanged; only the output format may differ.
    Identity,
    /// Resize so the longer edge equals the configured preview size.
    Preview,
}

impl Variant {
    /// Map a requested name to its transform. Empty and unknown names are
    /// [`Variant::Identity`].
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("preview") => Self::Preview,
            _ => Self::Identity,
        }
    }

    /// Token used in derived artifact file names.
    pub fn token(self) -> &'static str {
        match self {
            Self::Identity => "original",
            Self::Preview => "preview",
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::Identity
    }

    /// Every token that can appear in a derived file name.
    pub fn all_tokens() -> &'static [&'static str] {
        &["original", "preview"]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
