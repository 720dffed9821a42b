use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for entity IDs. Handles are `Copy` and compare cheaply.
///
/// Interned strings are never freed: every id allocated or interned lives for
/// the rest of the process. Resolve ids coming from outside (user input,
/// lookups) with `lookup`, which never grows the interner.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern an existing identifier string.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Allocate a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self::intern(&uuid::Uuid::new_v4().to_string())
            }

            /// Find an already-interned identifier without interning it.
            /// `None` means no entity has ever carried this id.
            pub fn lookup(s: &str) -> Option<Self> {
                INTERNER.get(s).map(Self)
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identity of a node. Immutable once allocated.
    NodeId
);

interned_id!(
    /// Identity of a connection between two nodes.
    ConnectionId
);

interned_id!(
    /// Identity of a canvas workspace.
    CanvasId
);
