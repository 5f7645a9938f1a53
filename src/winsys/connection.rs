use crate::icon::Icon;
use crate::property::Property;
use crate::window::Atom;
use crate::window::Pixmap;
use crate::window::Window;
use crate::Result;

/// The request/response channel to the display server.
///
/// Every component of the layer borrows one implementor of this trait and
/// performs all of its reads and writes through it, one round trip at a
/// time. Errors returned from these methods are connection-level failures;
/// an unset property is not an error but `Ok(None)`.
pub trait Connection {
    fn root(&self) -> Window;
    fn flush(&self) -> bool;

    // Atoms
    fn intern_atom(
        &self,
        name: &str,
    ) -> Result<Atom>;
    fn atom_name(
        &self,
        atom: Atom,
    ) -> Result<String>;

    // Properties
    fn get_property(
        &self,
        window: Window,
        property: Atom,
    ) -> Result<Option<Property>>;
    fn set_property(
        &self,
        window: Window,
        property: Atom,
        value: &Property,
    ) -> Result<()>;

    /// Sends a 32-bit client message to the root window on behalf of `window`.
    fn send_root_message(
        &self,
        window: Window,
        type_: Atom,
        data: [u32; 5],
    ) -> Result<()>;

    /// Reads the contents of `pixmap` as opaque ARGB pixels. Set bits of a
    /// depth-1 pixmap read as white, clear bits as black.
    fn get_pixmap(
        &self,
        pixmap: Pixmap,
    ) -> Result<Icon>;
}
