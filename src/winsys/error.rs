//! Failure classes of the property layer

use crate::window::Atom;
use crate::window::Window;

use thiserror::Error;

/// Errors produced while translating properties.
///
/// Connection-level failures are not listed here; they travel as the
/// underlying `x11rb` errors inside [`anyhow::Error`].
#[derive(Debug, Error)]
pub enum Error {
    /// The property is not set on the window
    #[error("property {property} is not set on window {window:#x}")]
    Absent {
        property: String,
        window: Window,
    },

    /// The property exists but its contents cannot be interpreted
    #[error("property {property} on window {window:#x} is malformed: {reason}")]
    Malformed {
        property: String,
        window: Window,
        reason: &'static str,
    },

    /// The server does not know the atom
    #[error("atom {0} is unknown to the server")]
    UnknownAtom(Atom),

    /// The window has no icon usable at the requested size
    #[error("window {0:#x} has no usable icon")]
    NoIcon(Window),

    /// The requested icon would exceed the pixel limit
    #[error("requested icon size {width}x{height} is too large")]
    IconSize {
        width: u32,
        height: u32,
    },

    /// PNG serialization failed
    #[error("unable to encode icon: {0}")]
    Encoding(#[from] png::EncodingError),
}

impl Error {
    pub(crate) fn absent(
        property: &str,
        window: Window,
    ) -> Self {
        Self::Absent {
            property: property.to_owned(),
            window,
        }
    }

    pub(crate) fn malformed(
        property: &str,
        window: Window,
        reason: &'static str,
    ) -> Self {
        Self::Malformed {
            property: property.to_owned(),
            window,
            reason,
        }
    }
}
