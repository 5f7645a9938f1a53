use std::str::FromStr;

use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

pub type Window = u32;
pub type Atom = u32;
pub type Pixmap = u32;

/// The "no window" handle, as used by `WM_TRANSIENT_FOR` and friends.
pub const NONE: Window = 0;

/// Raw `WM_STATE` code. Values outside the known states pass through untouched.
pub type StateCode = u32;

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum IcccmWindowState {
    Withdrawn,
    Normal,
    Iconic,
}

impl IcccmWindowState {
    pub const WITHDRAWN: StateCode = 0;
    pub const NORMAL: StateCode = 1;
    pub const ICONIC: StateCode = 3;

    pub fn from_code(code: StateCode) -> Option<Self> {
        match code {
            Self::WITHDRAWN => Some(Self::Withdrawn),
            Self::NORMAL => Some(Self::Normal),
            Self::ICONIC => Some(Self::Iconic),
            _ => None,
        }
    }
}

impl Default for IcccmWindowState {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<IcccmWindowState> for StateCode {
    fn from(state: IcccmWindowState) -> Self {
        match state {
            IcccmWindowState::Withdrawn => IcccmWindowState::WITHDRAWN,
            IcccmWindowState::Normal => IcccmWindowState::NORMAL,
            IcccmWindowState::Iconic => IcccmWindowState::ICONIC,
        }
    }
}

/// Semantic window type, keyed by the suffix of its `_NET_WM_WINDOW_TYPE_*` atom.
#[derive(
    Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter,
)]
pub enum WindowType {
    #[strum(serialize = "_DESKTOP")]
    Desktop,
    #[strum(serialize = "_DOCK")]
    Dock,
    #[strum(serialize = "_TOOLBAR")]
    Toolbar,
    #[strum(serialize = "_MENU")]
    Menu,
    #[strum(serialize = "_UTILITY")]
    Utility,
    #[strum(serialize = "_SPLASH")]
    Splash,
    #[strum(serialize = "_DIALOG")]
    Dialog,
    #[strum(serialize = "_DROPDOWN_MENU")]
    DropdownMenu,
    #[strum(serialize = "_POPUP_MENU")]
    PopupMenu,
    #[strum(serialize = "_TOOLTIP")]
    Tooltip,
    #[strum(serialize = "_NOTIFICATION")]
    Notification,
    #[strum(serialize = "_COMBO")]
    Combo,
    #[strum(serialize = "_DND")]
    Dnd,
    #[strum(serialize = "_NORMAL")]
    Normal,
}

impl WindowType {
    pub const ATOM_PREFIX: &'static str = "_NET_WM_WINDOW_TYPE";

    /// Classifies a `_NET_WM_WINDOW_TYPE` list by its head.
    ///
    /// Clients list types from most to least specific, so only the first
    /// entry is consulted; an empty list or an unknown name yields
    /// [`WindowType::Normal`].
    pub fn classify<S: AsRef<str>>(types: &[S]) -> Self {
        types
            .first()
            .map_or(Self::Normal, |name| Self::from_atom_name(name.as_ref()))
    }

    /// Accepts both the full atom name and its bare suffix (`"_DIALOG"`).
    pub fn from_atom_name(name: &str) -> Self {
        let suffix = name.strip_prefix(Self::ATOM_PREFIX).unwrap_or(name);
        Self::from_str(suffix).unwrap_or(Self::Normal)
    }

    pub fn atom_name(self) -> String {
        let suffix: &'static str = self.into();
        format!("{}{}", Self::ATOM_PREFIX, suffix)
    }
}

impl Default for WindowType {
    fn default() -> Self {
        Self::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn only_the_first_type_counts() {
        assert_eq!(WindowType::classify(&["_DIALOG", "_NORMAL"]), WindowType::Dialog);
        assert_eq!(WindowType::classify(&["_DIALOG"]), WindowType::Dialog);
        assert_eq!(
            WindowType::classify(&["_NET_WM_WINDOW_TYPE_NORMAL", "_NET_WM_WINDOW_TYPE_DOCK"]),
            WindowType::Normal
        );
    }

    #[test]
    fn empty_or_unknown_types_are_normal() {
        let empty: [&str; 0] = [];

        assert_eq!(WindowType::classify(&empty), WindowType::Normal);
        assert_eq!(WindowType::classify(&["_UNKNOWN"]), WindowType::Normal);
        assert_eq!(WindowType::classify(&["_UNKNOWN", "_DOCK"]), WindowType::Normal);
        assert_eq!(WindowType::classify(&["_NET_WM_WINDOW_TYPE"]), WindowType::Normal);
        assert_eq!(WindowType::classify(&["_dialog"]), WindowType::Normal);
    }

    #[test]
    fn full_atom_names_resolve_to_every_type() {
        for type_ in WindowType::iter() {
            assert_eq!(WindowType::classify(&[type_.atom_name()]), type_);
        }

        assert_eq!(
            WindowType::classify(&["_NET_WM_WINDOW_TYPE_COMBO"]),
            WindowType::Combo
        );
        assert_eq!(
            WindowType::classify(&["_NET_WM_WINDOW_TYPE_DND"]),
            WindowType::Dnd
        );
    }

    #[test]
    fn state_codes() {
        assert_eq!(StateCode::from(IcccmWindowState::Iconic), 3);
        assert_eq!(IcccmWindowState::from_code(0), Some(IcccmWindowState::Withdrawn));
        assert_eq!(IcccmWindowState::from_code(2), None);
        assert_eq!(IcccmWindowState::default(), IcccmWindowState::Normal);
    }
}
