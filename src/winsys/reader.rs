use crate::connection::Connection;
use crate::error::Error;
use crate::hints::Hints;
use crate::hints::MotifHints;
use crate::hints::SizeHints;
use crate::icon;
use crate::icon::Rgb;
use crate::property;
use crate::property::Convention;
use crate::property::Property;
use crate::property::Role;
use crate::property::STRING;
use crate::property::WM_HINTS;
use crate::property::WM_NORMAL_HINTS;
use crate::property::WM_STATE;
use crate::property::WM_TRANSIENT_FOR;
use crate::property::_MOTIF_WM_HINTS;
use crate::property::_NET_ACTIVE_WINDOW;
use crate::property::_NET_WM_STATE;
use crate::property::_NET_WM_WINDOW_TYPE;
use crate::window::IcccmWindowState;
use crate::window::StateCode;
use crate::window::Window;
use crate::window::WindowType;
use crate::window::NONE;
use crate::Result;

use x11rb::properties;

/// Normalized, read-only view of window properties.
///
/// Every accessor except [`PropertyReader::active_window`] resolves absent or
/// malformed properties, and failed round trips, to a fixed default.
pub struct PropertyReader<'conn, C: Connection> {
    conn: &'conn C,
}

impl<'conn, C: Connection> PropertyReader<'conn, C> {
    pub fn new(conn: &'conn C) -> Self {
        Self {
            conn,
        }
    }

    /// `_NET_WM_NAME`, then `WM_NAME`.
    pub fn name(
        &self,
        window: Window,
    ) -> String {
        self.first_of(window, Role::Name, |property| property.text())
            .unwrap_or_default()
    }

    /// `WM_CLASS`, then `_NET_WM_CLASS`; never empty.
    pub fn class(
        &self,
        window: Window,
    ) -> Vec<String> {
        self.first_of(window, Role::Class, |property| {
            decode_class(property)
                .filter(|class| class.iter().any(|name| !name.is_empty()))
        })
        .unwrap_or_else(|| vec![String::new()])
    }

    /// `WM_COMMAND`, then `_NET_WM_COMMAND`, with arguments joined by spaces.
    pub fn command(
        &self,
        window: Window,
    ) -> String {
        self.first_of(window, Role::Command, |property| {
            property.strings().map(|argv| argv.join(" "))
        })
        .unwrap_or_default()
    }

    /// `WM_ICON_NAME`, then `_NET_WM_ICON_NAME`; the legacy value wins here,
    /// unlike [`PropertyReader::name`].
    pub fn icon_name(
        &self,
        window: Window,
    ) -> String {
        self.first_of(window, Role::IconName, |property| property.text())
            .unwrap_or_default()
    }

    pub fn borderless(
        &self,
        window: Window,
    ) -> bool {
        self.words(window, _MOTIF_WM_HINTS)
            .ok()
            .and_then(|words| MotifHints::from_words(&words))
            .map_or(false, |hints| !hints.decorated())
    }

    pub fn size_hints(
        &self,
        window: Window,
    ) -> Option<SizeHints> {
        self.fetch(window, WM_NORMAL_HINTS)
            .ok()
            .and_then(|property| SizeHints::from_property(&property))
    }

    pub fn min_size(
        &self,
        window: Window,
    ) -> (u32, u32) {
        self.size_hints(window)
            .map_or((0, 0), |hints| hints.min_size())
    }

    /// Adjusts a requested size to the window's resize increments, returning
    /// the request unchanged if the window's size hints are unavailable.
    pub fn size_with_increment(
        &self,
        window: Window,
        width: u16,
        height: u16,
    ) -> (u16, u16) {
        match self.size_hints(window) {
            Some(hints) => hints.apply_increment(width, height),
            None => {
                warn!(
                    "could not apply size increment to window {:#0x}: no usable {}",
                    window, WM_NORMAL_HINTS
                );

                (width, height)
            },
        }
    }

    pub fn wm_hints(
        &self,
        window: Window,
    ) -> Option<Hints> {
        self.words(window, WM_HINTS)
            .ok()
            .and_then(|words| Hints::from_words(&words))
    }

    pub fn override_redirect(
        &self,
        window: Window,
    ) -> bool {
        self.wm_hints(window)
            .map_or(false, |hints| hints.override_redirect())
    }

    pub fn urgent(
        &self,
        window: Window,
    ) -> bool {
        self.wm_hints(window).map_or(false, |hints| hints.urgent)
    }

    /// The raw `WM_STATE` code, `Normal` if unreadable.
    pub fn state(
        &self,
        window: Window,
    ) -> StateCode {
        self.words(window, WM_STATE)
            .ok()
            .and_then(|words| words.first().copied())
            .unwrap_or_else(|| IcccmWindowState::Normal.into())
    }

    pub fn transient_for(
        &self,
        window: Window,
    ) -> Window {
        self.words(window, WM_TRANSIENT_FOR)
            .ok()
            .and_then(|words| words.first().copied())
            .unwrap_or(NONE)
    }

    /// The `_NET_WM_STATE` atom names in stored order, empty if unreadable.
    pub fn extended_hints(
        &self,
        window: Window,
    ) -> Vec<String> {
        self.atom_names(window, _NET_WM_STATE)
            .unwrap_or_else(|_| Vec::with_capacity(0))
    }

    pub fn has_extended_hint(
        &self,
        window: Window,
        hint: &str,
    ) -> bool {
        self.extended_hints(window).iter().any(|current| current == hint)
    }

    pub fn window_type(
        &self,
        window: Window,
    ) -> WindowType {
        self.atom_names(window, _NET_WM_WINDOW_TYPE)
            .map_or(WindowType::Normal, |types| WindowType::classify(&types))
    }

    /// The root window's `_NET_ACTIVE_WINDOW`.
    ///
    /// Unlike the other accessors this fails when the value is unavailable,
    /// there being no sensible default.
    pub fn active_window(&self) -> Result<Window> {
        let root = self.conn.root();

        self.words(root, _NET_ACTIVE_WINDOW)?
            .first()
            .copied()
            .ok_or_else(|| Error::malformed(_NET_ACTIVE_WINDOW, root, "empty").into())
    }

    pub fn icon(
        &self,
        window: Window,
        width: u32,
        height: u32,
        background: Rgb,
    ) -> Vec<u8> {
        icon::extract(self.conn, window, width, height, background)
    }

    pub(crate) fn fetch(
        &self,
        window: Window,
        name: &str,
    ) -> Result<Property> {
        let atom = self.conn.intern_atom(name)?;

        self.conn
            .get_property(window, atom)?
            .ok_or_else(|| Error::absent(name, window).into())
    }

    pub(crate) fn words(
        &self,
        window: Window,
        name: &str,
    ) -> Result<Vec<u32>> {
        let property = self.fetch(window, name)?;

        let words = property
            .value32()
            .ok_or_else(|| Error::malformed(name, window, "expected 32-bit values"))?;

        Ok(words.collect())
    }

    pub(crate) fn atom_names(
        &self,
        window: Window,
        name: &str,
    ) -> Result<Vec<String>> {
        self.words(window, name)?
            .into_iter()
            .map(|atom| self.conn.atom_name(atom))
            .collect()
    }

    /// Walks the role's conventions in order, returning the first property
    /// that is present and decodes.
    fn first_of<T, F>(
        &self,
        window: Window,
        role: Role,
        decode: F,
    ) -> Option<T>
    where
        F: Fn(&Property) -> Option<T>,
    {
        role.order().iter().find_map(|&convention: &Convention| {
            self.fetch(window, convention.property(role))
                .ok()
                .and_then(|property| decode(&property))
        })
    }
}

/// `STRING` values are split into instance and class the ICCCM way;
/// anything else is read as a plain string list.
fn decode_class(property: &Property) -> Option<Vec<String>> {
    match properties::WmClass::from_reply(property.to_reply()) {
        Ok(wm_class) => {
            let instance = property::decode(STRING, wm_class.instance())?;
            let class = property::decode(STRING, wm_class.class())?;

            if class.is_empty() {
                Some(vec![instance])
            } else {
                Some(vec![instance, class])
            }
        },
        Err(_) => property.strings(),
    }
}
