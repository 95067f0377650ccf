//! Project-scoped capabilities.
//!
//! A user's standing on a project is an 8-bit [`Capability`] mask. Each bit
//! corresponds to exactly one [`ProjectRole`], which carries the canonical
//! display noun used when naming mirrored directory roles:
//!
//! ```text
//! "{ProjectName} {Noun}"   e.g. "Foo Leader", "Foo Beta Tester"
//! ```
//!
//! The noun table is a `match` on the enum, so adding a role without a noun
//! fails to compile.
//!
//! # Example
//!
//! ```
//! use projects_shared::{Capability, ProjectRole};
//!
//! let mask = ProjectRole::Leader.bit() | ProjectRole::Developer.bit();
//! assert!(mask.contains(Capability::LEADER));
//! assert_eq!(ProjectRole::BetaTester.noun(), "Beta Tester");
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

bitflags! {
    /// Capability bits a user holds on a project.
    ///
    /// Bit values are part of the stored record format and must not change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Capability: u8 {
        const LEADER       = 0b0000_0001;
        const BUG_REPORTER = 0b0000_0010;
        const SPONSOR      = 0b0000_0100;
        const RESEARCHER   = 0b0000_1000;
        const TRANSLATOR   = 0b0001_0000;
        const DESIGNER     = 0b0010_0000;
        const DEVELOPER    = 0b0100_0000;
        const BETA_TESTER  = 0b1000_0000;
    }
}

impl Capability {
    /// Roles whose bits are set in this mask, in bit order.
    pub fn roles(self) -> impl Iterator<Item = ProjectRole> {
        ProjectRole::ALL
            .into_iter()
            .filter(move |role| self.contains(role.bit()))
    }
}

// Stored as the raw mask.
impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Capability::from_bits_retain)
    }
}

/// A single capability, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProjectRole {
    Leader,
    BugReporter,
    Sponsor,
    Researcher,
    Translator,
    Designer,
    Developer,
    BetaTester,
}

impl ProjectRole {
    /// Every role, in bit order.
    pub const ALL: [ProjectRole; 8] = [
        ProjectRole::Leader,
        ProjectRole::BugReporter,
        ProjectRole::Sponsor,
        ProjectRole::Researcher,
        ProjectRole::Translator,
        ProjectRole::Designer,
        ProjectRole::Developer,
        ProjectRole::BetaTester,
    ];

    /// The bit this role occupies in a [`Capability`] mask.
    pub const fn bit(self) -> Capability {
        match self {
            ProjectRole::Leader => Capability::LEADER,
            ProjectRole::BugReporter => Capability::BUG_REPORTER,
            ProjectRole::Sponsor => Capability::SPONSOR,
            ProjectRole::Researcher => Capability::RESEARCHER,
            ProjectRole::Translator => Capability::TRANSLATOR,
            ProjectRole::Designer => Capability::DESIGNER,
            ProjectRole::Developer => Capability::DEVELOPER,
            ProjectRole::BetaTester => Capability::BETA_TESTER,
        }
    }

    /// Canonical display noun.
    pub const fn noun(self) -> &'static str {
        match self {
            ProjectRole::Leader => "Leader",
            ProjectRole::BugReporter => "Bug Reporter",
            ProjectRole::Sponsor => "Sponsor/Donator",
            ProjectRole::Researcher => "Researcher",
            ProjectRole::Translator => "Translator",
            ProjectRole::Designer => "Designer",
            ProjectRole::Developer => "Developer",
            ProjectRole::BetaTester => "Beta Tester",
        }
    }

    /// Heading used when listing all holders of this role.
    pub const fn plural(self) -> &'static str {
        match self {
            ProjectRole::Leader => "Leaders",
            ProjectRole::BugReporter => "Bug Reporters",
            ProjectRole::Sponsor => "Sponsors/Donators",
            ProjectRole::Researcher => "Researchers",
            ProjectRole::Translator => "Translators",
            ProjectRole::Designer => "Designers",
            ProjectRole::Developer => "Developers",
            ProjectRole::BetaTester => "Beta Testers",
        }
    }

    /// Name of the directory role mirroring this capability for a project.
    pub fn mirrored_role_name(self, project_name: &str) -> String {
        format!("{} {}", project_name, self.noun())
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown project role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for ProjectRole {
    type Err = UnknownRole;

    /// Accepts the display noun ("Beta Tester"), the identifier ("BetaTester")
    /// or a kebab/snake form ("beta-tester"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        ProjectRole::ALL
            .into_iter()
            .find(|role| {
                let ident = format!("{:?}", role).to_lowercase();
                let noun: String = role
                    .noun()
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect();
                wanted == ident || wanted == noun
            })
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
