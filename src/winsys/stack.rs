use crate::connection::Connection;
use crate::property::Property;
use crate::property::WINDOW;
use crate::property::_NET_CLIENT_LIST;
use crate::property::_NET_CLIENT_LIST_STACKING;
use crate::window::Window;
use crate::Result;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// The two window orders the root window advertises.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientLists {
    /// All managed windows, in the order they were managed
    pub clients: Vec<Window>,
    /// Mapped windows, bottom to top
    pub mapping_order: Vec<Window>,
}

/// Owner of the [`ClientLists`].
///
/// Lists are only changed through [`StackingOrder::update`], which holds the
/// lock until every changed list has been republished, so no reader of the
/// root properties can observe a list that differs from the in-memory one
/// once the call returns.
pub struct StackingOrder<'conn, C: Connection> {
    conn: &'conn C,
    lists: Mutex<ClientLists>,
}

impl<'conn, C: Connection> StackingOrder<'conn, C> {
    pub fn new(conn: &'conn C) -> Self {
        Self {
            conn,
            lists: Mutex::new(ClientLists::default()),
        }
    }

    /// Writes `_NET_CLIENT_LIST` from `clients`, as given.
    pub fn publish_client_list(
        &self,
        clients: &[Window],
    ) -> Result<()> {
        self.publish(_NET_CLIENT_LIST, clients)
    }

    /// Writes `_NET_CLIENT_LIST_STACKING` from `mapping_order`, as given.
    pub fn publish_stacking_list(
        &self,
        mapping_order: &[Window],
    ) -> Result<()> {
        self.publish(_NET_CLIENT_LIST_STACKING, mapping_order)
    }

    pub fn snapshot(&self) -> ClientLists {
        self.lock().clone()
    }

    /// Applies `change` to a copy of the lists and republishes whichever
    /// changed.
    ///
    /// The copy replaces the lists only once publishing succeeds. If it
    /// fails, the previous contents are written back on a best-effort basis
    /// and the error is returned; if `change` panics, nothing is replaced.
    pub fn update<F, T>(
        &self,
        change: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut ClientLists) -> T,
    {
        let mut lists = self.lock();
        let mut next = lists.clone();
        let value = change(&mut next);

        let clients_changed = next.clients != lists.clients;
        let stacking_changed = next.mapping_order != lists.mapping_order;

        let published = (|| -> Result<()> {
            if clients_changed {
                self.publish_client_list(&next.clients)?;
            }

            if stacking_changed {
                self.publish_stacking_list(&next.mapping_order)?;
            }

            Ok(())
        })();

        if let Err(err) = published {
            warn!("rolling back client lists after failed publish: {}", err);

            if clients_changed {
                drop(self.publish_client_list(&lists.clients));
            }

            if stacking_changed {
                drop(self.publish_stacking_list(&lists.mapping_order));
            }

            return Err(err);
        }

        *lists = next;
        Ok(value)
    }

    /// Appends a newly managed window to both lists, top of the stack.
    pub fn manage(
        &self,
        window: Window,
    ) -> Result<()> {
        self.update(|lists| {
            if !lists.clients.contains(&window) {
                lists.clients.push(window);
            }

            if !lists.mapping_order.contains(&window) {
                lists.mapping_order.push(window);
            }
        })
    }

    pub fn unmanage(
        &self,
        window: Window,
    ) -> Result<()> {
        self.update(|lists| {
            lists.clients.retain(|&client| client != window);
            lists.mapping_order.retain(|&client| client != window);
        })
    }

    /// Moves `window` to the top of the mapping order.
    pub fn raise(
        &self,
        window: Window,
    ) -> Result<bool> {
        self.update(|lists| {
            let order = &mut lists.mapping_order;

            order.iter().position(|&client| client == window).map_or(false, |index| {
                let window = order.remove(index);
                order.push(window);
                true
            })
        })
    }

    /// Moves `window` to the bottom of the mapping order.
    pub fn lower(
        &self,
        window: Window,
    ) -> Result<bool> {
        self.update(|lists| {
            let order = &mut lists.mapping_order;

            order.iter().position(|&client| client == window).map_or(false, |index| {
                let window = order.remove(index);
                order.insert(0, window);
                true
            })
        })
    }

    fn publish(
        &self,
        name: &str,
        windows: &[Window],
    ) -> Result<()> {
        let root = self.conn.root();
        let property = self.conn.intern_atom(name)?;

        self.conn
            .set_property(root, property, &Property::from_u32s(WINDOW, windows))?;
        self.conn.flush();
        Ok(())
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, ClientLists> {
        self.lists.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
