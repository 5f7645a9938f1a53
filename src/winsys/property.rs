//! Raw property values and the conventions that name them

use crate::window::Atom;

use x11rb::protocol::xproto::GetPropertyReply;

// ICCCM client properties
pub const WM_NAME: &str = "WM_NAME";
pub const WM_ICON_NAME: &str = "WM_ICON_NAME";
pub const WM_CLASS: &str = "WM_CLASS";
pub const WM_COMMAND: &str = "WM_COMMAND";
pub const WM_HINTS: &str = "WM_HINTS";
pub const WM_NORMAL_HINTS: &str = "WM_NORMAL_HINTS";
pub const WM_TRANSIENT_FOR: &str = "WM_TRANSIENT_FOR";

// ICCCM window manager properties
pub const WM_STATE: &str = "WM_STATE";

// EWMH root properties
pub const _NET_ACTIVE_WINDOW: &str = "_NET_ACTIVE_WINDOW";
pub const _NET_CLIENT_LIST: &str = "_NET_CLIENT_LIST";
pub const _NET_CLIENT_LIST_STACKING: &str = "_NET_CLIENT_LIST_STACKING";

// EWMH application properties
pub const _NET_WM_NAME: &str = "_NET_WM_NAME";
pub const _NET_WM_ICON_NAME: &str = "_NET_WM_ICON_NAME";
pub const _NET_WM_CLASS: &str = "_NET_WM_CLASS";
pub const _NET_WM_COMMAND: &str = "_NET_WM_COMMAND";
pub const _NET_WM_STATE: &str = "_NET_WM_STATE";
pub const _NET_WM_WINDOW_TYPE: &str = "_NET_WM_WINDOW_TYPE";
pub const _NET_WM_ALLOWED_ACTIONS: &str = "_NET_WM_ALLOWED_ACTIONS";
pub const _NET_WM_ICON: &str = "_NET_WM_ICON";

// Motif
pub const _MOTIF_WM_HINTS: &str = "_MOTIF_WM_HINTS";

// Property types
pub const UTF8_STRING: &str = "UTF8_STRING";

// Predefined by the core protocol
pub const ATOM: Atom = 4;
pub const CARDINAL: Atom = 6;
pub const STRING: Atom = 31;
pub const WINDOW: Atom = 33;
pub const WM_SIZE_HINTS: Atom = 41;

/// The property naming scheme a value is looked up under.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Convention {
    /// The legacy scheme (`WM_*`)
    Icccm,
    /// The extended scheme (`_NET_WM_*`)
    Ewmh,
}

/// A fact both conventions carry under different property names.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Name,
    Class,
    Command,
    IconName,
}

impl Convention {
    pub const NAME_ORDER: &'static [Convention] = &[Convention::Ewmh, Convention::Icccm];
    pub const CLASS_ORDER: &'static [Convention] = &[Convention::Icccm, Convention::Ewmh];
    pub const COMMAND_ORDER: &'static [Convention] = &[Convention::Icccm, Convention::Ewmh];
    // Legacy first, the reverse of NAME_ORDER.
    pub const ICON_NAME_ORDER: &'static [Convention] = &[Convention::Icccm, Convention::Ewmh];

    pub fn property(
        self,
        role: Role,
    ) -> &'static str {
        match (self, role) {
            (Convention::Icccm, Role::Name) => WM_NAME,
            (Convention::Icccm, Role::Class) => WM_CLASS,
            (Convention::Icccm, Role::Command) => WM_COMMAND,
            (Convention::Icccm, Role::IconName) => WM_ICON_NAME,
            (Convention::Ewmh, Role::Name) => _NET_WM_NAME,
            (Convention::Ewmh, Role::Class) => _NET_WM_CLASS,
            (Convention::Ewmh, Role::Command) => _NET_WM_COMMAND,
            (Convention::Ewmh, Role::IconName) => _NET_WM_ICON_NAME,
        }
    }
}

impl Role {
    pub fn order(self) -> &'static [Convention] {
        match self {
            Role::Name => Convention::NAME_ORDER,
            Role::Class => Convention::CLASS_ORDER,
            Role::Command => Convention::COMMAND_ORDER,
            Role::IconName => Convention::ICON_NAME_ORDER,
        }
    }
}

/// A property value as transferred over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub type_: Atom,
    pub format: u8,
    pub value: Vec<u8>,
}

impl Property {
    pub fn new(
        type_: Atom,
        format: u8,
        value: Vec<u8>,
    ) -> Self {
        Self {
            type_,
            format,
            value,
        }
    }

    pub fn from_bytes(
        type_: Atom,
        bytes: &[u8],
    ) -> Self {
        Self::new(type_, 8, bytes.to_vec())
    }

    pub fn from_text(
        type_: Atom,
        text: &str,
    ) -> Self {
        Self::from_bytes(type_, text.as_bytes())
    }

    /// Each string is written NUL-terminated, as `WM_CLASS` expects.
    pub fn from_strings<S: AsRef<str>>(
        type_: Atom,
        strings: &[S],
    ) -> Self {
        let mut value = Vec::new();

        for string in strings {
            value.extend_from_slice(string.as_ref().as_bytes());
            value.push(0);
        }

        Self::new(type_, 8, value)
    }

    pub fn from_u32s(
        type_: Atom,
        values: &[u32],
    ) -> Self {
        Self::new(
            type_,
            32,
            values.iter().flat_map(|value| value.to_ne_bytes().to_vec()).collect(),
        )
    }

    /// Number of elements in units of the property's format.
    pub fn len(&self) -> u32 {
        match self.format {
            16 => (self.value.len() / 2) as u32,
            32 => (self.value.len() / 4) as u32,
            _ => self.value.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn value8(&self) -> Option<&[u8]> {
        if self.format == 8 {
            Some(&self.value)
        } else {
            None
        }
    }

    pub fn value32(&self) -> Option<impl Iterator<Item = u32> + '_> {
        if self.format == 32 && self.value.len() % 4 == 0 {
            Some(
                self.value
                    .chunks_exact(4)
                    .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
            )
        } else {
            None
        }
    }

    /// Decodes a text property; `STRING` is Latin-1, anything else UTF-8.
    pub fn text(&self) -> Option<String> {
        let bytes = self.value8()?;
        decode(self.type_, bytes)
    }

    /// The value as x11rb would have delivered it, for its property parsers.
    pub fn to_reply(&self) -> GetPropertyReply {
        GetPropertyReply {
            format: self.format,
            sequence: 0,
            length: (self.value.len() as u32 + 3) / 4,
            type_: self.type_,
            bytes_after: 0,
            value_len: self.len(),
            value: self.value.clone(),
        }
    }

    /// Decodes a list of NUL-separated strings, ignoring the final terminator.
    pub fn strings(&self) -> Option<Vec<String>> {
        let bytes = self.value8()?;

        if bytes.is_empty() {
            return Some(Vec::with_capacity(0));
        }

        let bytes = bytes.strip_suffix(&[0u8][..]).unwrap_or(bytes);

        bytes
            .split(|&byte| byte == 0)
            .map(|string| decode(self.type_, string))
            .collect()
    }
}

pub(crate) fn decode(
    type_: Atom,
    bytes: &[u8],
) -> Option<String> {
    if type_ == STRING {
        Some(bytes.iter().map(|&byte| byte as char).collect())
    } else {
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }
}
