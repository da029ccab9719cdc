//! Opaque identifier newtypes.
//!
//! Every entity in a run snapshot is located by identifier, never by index
//! (indexes on the wire are advisory hints only). Wrapping the raw strings
//! keeps a checklist id from being handed to an item lookup by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw identifier string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of a playbook run, stable for the run's lifetime.
    RunId
);
id_type!(
    /// Identifier of a checklist, unique within its run.
    ChecklistId
);
id_type!(
    /// Identifier of a checklist item, unique within its checklist.
    ItemId
);
id_type!(
    /// Identifier of a timeline event.
    EventId
);
id_type!(
    /// Identifier of a status post.
    PostId
);
id_type!(
    /// Identifier of a user (owner, reporter, assignee, participant).
    UserId
);
