//! The fixed set of narration voices.

use serde::{Deserialize, Serialize};

/// Narration voice, from the fixed set the synthesis endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Nova,
    Onyx,
    Shimmer,
}

impl Voice {
    /// Every selectable voice, in display order.
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Nova,
        Voice::Onyx,
        Voice::Shimmer,
    ];

    /// Identifier sent on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Nova => "nova",
            Voice::Onyx => "onyx",
            Voice::Shimmer => "shimmer",
        }
    }

    /// Human-readable label for the voice selector.
    pub fn label(&self) -> &'static str {
        match self {
            Voice::Alloy => "Alloy",
            Voice::Echo => "Echo",
            Voice::Fable => "Fable",
            Voice::Nova => "Nova",
            Voice::Onyx => "Onyx",
            Voice::Shimmer => "Shimmer",
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Voice::Nova
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant_once() {
        for v in Voice::ALL {
            assert_eq!(Voice::ALL.iter().filter(|&&x| x == v).count(), 1);
        }
    }

    #[test]
    fn ids_are_distinct() {
        for a in Voice::ALL {
            for b in Voice::ALL {
                if a != b {
                    assert_ne!(a.id(), b.id());
                }
            }
        }
    }

    #[test]
    fn default_is_in_the_set() {
        assert!(Voice::ALL.contains(&Voice::default()));
    }
}
