use crate::connection::Connection;
use crate::error::Error;
use crate::icon::Icon;
use crate::property;
use crate::property::Property;
use crate::window::Atom;
use crate::window::Pixmap;
use crate::window::Window;
use crate::window::WindowType;
use crate::Result;

use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::TryInto;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use x11rb::connection;
use x11rb::errors::ReplyError;
use x11rb::image::Image;
use x11rb::image::PixelLayout;
use x11rb::protocol::xproto;
use x11rb::protocol::xproto::ConnectionExt;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::xproto::ImageFormat;
use x11rb::protocol::xproto::CLIENT_MESSAGE_EVENT;
use x11rb::protocol::ErrorKind;

use anyhow::anyhow;
use strum::IntoEnumIterator;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        UTF8_STRING,

        // ICCCM client properties
        WM_NAME,
        WM_ICON_NAME,
        WM_CLASS,
        WM_COMMAND,
        WM_HINTS,
        WM_NORMAL_HINTS,
        WM_TRANSIENT_FOR,

        // ICCCM window manager properties
        WM_STATE,

        // EWMH root properties
        _NET_ACTIVE_WINDOW,
        _NET_CLIENT_LIST,
        _NET_CLIENT_LIST_STACKING,

        // EWMH application properties
        _NET_WM_NAME,
        _NET_WM_ICON_NAME,
        _NET_WM_CLASS,
        _NET_WM_COMMAND,
        _NET_WM_STATE,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_ALLOWED_ACTIONS,
        _NET_WM_ICON,

        // Motif
        _MOTIF_WM_HINTS,
    }
}

#[derive(Default)]
struct AtomCache {
    by_name: HashMap<String, Atom>,
    by_atom: HashMap<Atom, String>,
}

impl AtomCache {
    fn insert(
        &mut self,
        name: String,
        atom: Atom,
    ) {
        self.by_atom.insert(atom, name.clone());
        self.by_name.insert(name, atom);
    }
}

/// [`Connection`] over a live X11 connection.
///
/// Names the layer uses are interned up front; anything else is interned
/// on first use and cached in both directions.
pub struct XConnection<'conn, Conn: connection::Connection> {
    conn: &'conn Conn,
    screen: usize,
    root: Window,
    cache: Mutex<AtomCache>,
}

impl<'conn, Conn: connection::Connection> XConnection<'conn, Conn> {
    pub fn new(
        conn: &'conn Conn,
        screen_num: usize,
    ) -> Result<Self> {
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| anyhow!("no screen with number {}", screen_num))?;

        let atoms = Atoms::new(conn)?.reply()?;

        let known: HashMap<&str, Atom> = map!(
            property::UTF8_STRING => atoms.UTF8_STRING,
            property::WM_NAME => atoms.WM_NAME,
            property::WM_ICON_NAME => atoms.WM_ICON_NAME,
            property::WM_CLASS => atoms.WM_CLASS,
            property::WM_COMMAND => atoms.WM_COMMAND,
            property::WM_HINTS => atoms.WM_HINTS,
            property::WM_NORMAL_HINTS => atoms.WM_NORMAL_HINTS,
            property::WM_TRANSIENT_FOR => atoms.WM_TRANSIENT_FOR,
            property::WM_STATE => atoms.WM_STATE,
            property::_NET_ACTIVE_WINDOW => atoms._NET_ACTIVE_WINDOW,
            property::_NET_CLIENT_LIST => atoms._NET_CLIENT_LIST,
            property::_NET_CLIENT_LIST_STACKING => atoms._NET_CLIENT_LIST_STACKING,
            property::_NET_WM_NAME => atoms._NET_WM_NAME,
            property::_NET_WM_ICON_NAME => atoms._NET_WM_ICON_NAME,
            property::_NET_WM_CLASS => atoms._NET_WM_CLASS,
            property::_NET_WM_COMMAND => atoms._NET_WM_COMMAND,
            property::_NET_WM_STATE => atoms._NET_WM_STATE,
            property::_NET_WM_WINDOW_TYPE => atoms._NET_WM_WINDOW_TYPE,
            property::_NET_WM_ALLOWED_ACTIONS => atoms._NET_WM_ALLOWED_ACTIONS,
            property::_NET_WM_ICON => atoms._NET_WM_ICON,
            property::_MOTIF_WM_HINTS => atoms._MOTIF_WM_HINTS,
        );

        let mut cache = AtomCache::default();

        for (name, atom) in known {
            cache.insert(name.to_owned(), atom);
        }

        for &(name, atom) in &[
            ("ATOM", property::ATOM),
            ("CARDINAL", property::CARDINAL),
            ("STRING", property::STRING),
            ("WINDOW", property::WINDOW),
            ("WM_SIZE_HINTS", property::WM_SIZE_HINTS),
        ] {
            cache.insert(name.to_owned(), atom);
        }

        // Window types are resolved by name on every classification.
        let cookies = WindowType::iter()
            .map(|type_| -> Result<_> {
                let name = type_.atom_name();
                let cookie = conn.intern_atom(false, name.as_bytes())?;
                Ok((name, cookie))
            })
            .collect::<Result<Vec<_>>>()?;

        for (name, cookie) in cookies {
            cache.insert(name, cookie.reply()?.atom);
        }

        debug!("interned {} atoms on screen {}", cache.by_name.len(), screen_num);

        Ok(Self {
            conn,
            screen: screen_num,
            root,
            cache: Mutex::new(cache),
        })
    }

    #[inline]
    fn cache(&self) -> MutexGuard<'_, AtomCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The colour layout of the first true- or direct-colour visual of
    /// `depth` on this screen.
    fn pixel_layout(
        &self,
        depth: u8,
    ) -> Result<PixelLayout> {
        self.conn
            .setup()
            .roots
            .get(self.screen)
            .into_iter()
            .flat_map(|screen| screen.allowed_depths.iter())
            .filter(|allowed| allowed.depth == depth)
            .flat_map(|allowed| allowed.visuals.iter())
            .find_map(|&visual| PixelLayout::from_visual_type(visual).ok())
            .ok_or_else(|| anyhow!("no colour visual of depth {}", depth))
    }
}

impl<'conn, Conn: connection::Connection> Connection for XConnection<'conn, Conn> {
    #[inline]
    fn root(&self) -> Window {
        self.root
    }

    #[inline]
    fn flush(&self) -> bool {
        self.conn.flush().is_ok()
    }

    fn intern_atom(
        &self,
        name: &str,
    ) -> Result<Atom> {
        if let Some(&atom) = self.cache().by_name.get(name) {
            return Ok(atom);
        }

        let atom = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        self.cache().insert(name.to_owned(), atom);

        Ok(atom)
    }

    fn atom_name(
        &self,
        atom: Atom,
    ) -> Result<String> {
        if let Some(name) = self.cache().by_atom.get(&atom) {
            return Ok(name.clone());
        }

        let reply = self
            .conn
            .get_atom_name(atom)?
            .reply()
            .map_err(|err| atom_error(atom, err))?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        self.cache().insert(name.clone(), atom);

        Ok(name)
    }

    fn get_property(
        &self,
        window: Window,
        property: Atom,
    ) -> Result<Option<Property>> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                property,
                xproto::AtomEnum::ANY,
                0,
                std::u32::MAX,
            )?
            .reply()?;

        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }

        Ok(Some(Property::new(reply.type_, reply.format, reply.value)))
    }

    fn set_property(
        &self,
        window: Window,
        property: Atom,
        value: &Property,
    ) -> Result<()> {
        self.conn
            .change_property(
                xproto::PropMode::REPLACE,
                window,
                property,
                value.type_,
                value.format,
                value.len(),
                &value.value,
            )?
            .check()?;

        Ok(())
    }

    fn send_root_message(
        &self,
        window: Window,
        type_: Atom,
        data: [u32; 5],
    ) -> Result<()> {
        let event = xproto::ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_,
            data: data.into(),
        };

        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                &event,
            )?
            .check()?;

        Ok(())
    }

    fn get_pixmap(
        &self,
        pixmap: Pixmap,
    ) -> Result<Icon> {
        let geometry = self.conn.get_geometry(pixmap)?.reply()?;
        let (width, height) = (geometry.width, geometry.height);

        if width == 0
            || height == 0
            || usize::from(width) * usize::from(height) > Icon::MAX_ICON_PIXELS
        {
            return Err(anyhow!("pixmap {:#0x} has unusable size {}x{}", pixmap, width, height));
        }

        let reply = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, pixmap, 0, 0, width, height, !0)?
            .reply()?;

        let setup = self.conn.setup();
        let depth = reply.depth;

        let format = setup
            .pixmap_formats
            .iter()
            .find(|format| format.depth == depth)
            .ok_or_else(|| anyhow!("no pixmap format of depth {}", depth))?;

        let order = if depth == 1 {
            setup.bitmap_format_bit_order
        } else {
            setup.image_byte_order
        };

        let image = Image::new(
            width,
            height,
            format.scanline_pad.try_into()?,
            depth,
            format.bits_per_pixel.try_into()?,
            order.try_into()?,
            Cow::Owned(reply.data),
        )?;

        let layout = if depth == 1 {
            None
        } else {
            Some(self.pixel_layout(depth)?)
        };

        let mut pixels = Vec::with_capacity(usize::from(width) * usize::from(height));

        for y in 0..height {
            for x in 0..width {
                pixels.push(to_argb(layout, image.get_pixel(x, y)));
            }
        }

        Ok(Icon {
            width: u32::from(width),
            height: u32::from(height),
            pixels,
        })
    }
}

fn atom_error(
    atom: Atom,
    err: ReplyError,
) -> anyhow::Error {
    match err {
        ReplyError::X11Error(ref error) if error.error_kind == ErrorKind::Atom => {
            Error::UnknownAtom(atom).into()
        },
        err => err.into(),
    }
}

/// Converts a pixel value to opaque ARGB; without a layout the pixel is a
/// single bit.
fn to_argb(
    layout: Option<PixelLayout>,
    pixel: u32,
) -> u32 {
    match layout {
        None if pixel & 1 != 0 => 0xffff_ffff,
        None => 0xff00_0000,
        Some(layout) => {
            let (r, g, b) = layout.decode(pixel);

            0xff00_0000
                | u32::from(r >> 8) << 16
                | u32::from(g >> 8) << 8
                | u32::from(b >> 8)
        },
    }
}
