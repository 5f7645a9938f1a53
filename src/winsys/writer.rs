use crate::connection::Connection;
use crate::property::Property;
use crate::property::ATOM;
use crate::property::WINDOW;
use crate::property::WM_STATE;
use crate::property::_NET_ACTIVE_WINDOW;
use crate::property::_NET_WM_ALLOWED_ACTIONS;
use crate::property::_NET_WM_STATE;
use crate::reader::PropertyReader;
use crate::window::Atom;
use crate::window::StateCode;
use crate::window::Window;
use crate::window::NONE;
use crate::Result;

/// Mutates window state on the server.
///
/// All writes replace the whole property; connection failures propagate.
pub struct PropertyWriter<'conn, C: Connection> {
    conn: &'conn C,
}

impl<'conn, C: Connection> PropertyWriter<'conn, C> {
    /// Source indication sent with activation requests (pager / manager).
    pub const ACTIVATION_SOURCE: u32 = 2;

    pub fn new(conn: &'conn C) -> Self {
        Self {
            conn,
        }
    }

    /// Replaces `_NET_WM_ALLOWED_ACTIONS` with exactly `actions`.
    pub fn set_allowed_actions<S: AsRef<str>>(
        &self,
        window: Window,
        actions: &[S],
    ) -> Result<()> {
        let actions = self.intern_all(actions)?;
        self.replace(window, _NET_WM_ALLOWED_ACTIONS, &Property::from_u32s(ATOM, &actions))
    }

    /// Replaces `WM_STATE`; the code is not range checked.
    pub fn set_state(
        &self,
        window: Window,
        state: StateCode,
    ) -> Result<()> {
        let type_ = self.conn.intern_atom(WM_STATE)?;
        self.replace(window, WM_STATE, &Property::from_u32s(type_, &[state, NONE]))
    }

    /// Asks the window manager to activate `window`.
    ///
    /// This only sends a `_NET_ACTIVE_WINDOW` client message; whether the
    /// property changes is up to the manager's focus policy.
    pub fn request_activate(
        &self,
        window: Window,
    ) -> Result<()> {
        let type_ = self.conn.intern_atom(_NET_ACTIVE_WINDOW)?;

        self.conn.send_root_message(window, type_, [
            Self::ACTIVATION_SOURCE,
            x11rb::CURRENT_TIME,
            NONE,
            0,
            0,
        ])?;

        self.conn.flush();
        Ok(())
    }

    /// Asserts `window` as the root window's `_NET_ACTIVE_WINDOW`.
    pub fn set_active(
        &self,
        window: Window,
    ) -> Result<()> {
        let root = self.conn.root();
        self.replace(root, _NET_ACTIVE_WINDOW, &Property::from_u32s(WINDOW, &[window]))
    }

    /// Replaces `_NET_WM_STATE` with `hints`, in order.
    pub fn set_extended_hints<S: AsRef<str>>(
        &self,
        window: Window,
        hints: &[S],
    ) -> Result<()> {
        let hints = self.intern_all(hints)?;
        self.replace(window, _NET_WM_STATE, &Property::from_u32s(ATOM, &hints))
    }

    /// Appends `hint` to `_NET_WM_STATE`.
    ///
    /// An unreadable state counts as empty. Adding a hint that is already
    /// present stores it twice.
    pub fn add_extended_hint(
        &self,
        window: Window,
        hint: &str,
    ) -> Result<()> {
        let mut hints = PropertyReader::new(self.conn)
            .atom_names(window, _NET_WM_STATE)
            .unwrap_or_default();

        hints.push(hint.to_owned());
        self.set_extended_hints(window, &hints)
    }

    /// Removes the first occurrence of `hint` from `_NET_WM_STATE`.
    ///
    /// Nothing is written if the state cannot be read or does not contain
    /// the hint.
    pub fn remove_extended_hint(
        &self,
        window: Window,
        hint: &str,
    ) -> Result<()> {
        let mut hints = match PropertyReader::new(self.conn).atom_names(window, _NET_WM_STATE) {
            Ok(hints) => hints,
            Err(err) => {
                debug!("not removing {} from window {:#0x}: {}", hint, window, err);
                return Ok(());
            },
        };

        if remove_first(&mut hints, hint) {
            self.set_extended_hints(window, &hints)
        } else {
            Ok(())
        }
    }

    fn intern_all<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Atom>> {
        names
            .iter()
            .map(|name| self.conn.intern_atom(name.as_ref()))
            .collect()
    }

    fn replace(
        &self,
        window: Window,
        name: &str,
        value: &Property,
    ) -> Result<()> {
        let property = self.conn.intern_atom(name)?;
        self.conn.set_property(window, property, value)?;
        self.conn.flush();
        Ok(())
    }
}

/// Removes the first element equal to `hint`, keeping the rest in order.
pub fn remove_first(
    hints: &mut Vec<String>,
    hint: &str,
) -> bool {
    match hints.iter().position(|current| current == hint) {
        Some(index) => {
            hints.remove(index);
            true
        },
        None => false,
    }
}
