//! In-memory stand-in for the display server, used by the unit tests

use crate::connection::Connection;
use crate::icon::Icon;
use crate::property;
use crate::property::Property;
use crate::window::Atom;
use crate::window::Pixmap;
use crate::window::Window;
use crate::Result;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::anyhow;

pub const ROOT: Window = 0x1;
const FIRST_ATOM: Atom = 0x100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub window: Window,
    pub type_: String,
    pub data: [u32; 5],
}

#[derive(Default)]
struct AtomTable {
    by_name: HashMap<String, Atom>,
    by_atom: HashMap<Atom, String>,
}

pub struct FakeConnection {
    atoms: Mutex<AtomTable>,
    properties: Mutex<HashMap<(Window, Atom), Property>>,
    messages: Mutex<Vec<SentMessage>>,
    pixmaps: Mutex<HashMap<Pixmap, Icon>>,
    writes: AtomicUsize,
    broken: AtomicBool,
}

impl FakeConnection {
    pub fn new() -> Self {
        let mut atoms = AtomTable::default();

        for &(name, atom) in &[
            ("ATOM", property::ATOM),
            ("CARDINAL", property::CARDINAL),
            ("STRING", property::STRING),
            ("WINDOW", property::WINDOW),
            ("WM_SIZE_HINTS", property::WM_SIZE_HINTS),
        ] {
            atoms.by_name.insert(name.to_owned(), atom);
            atoms.by_atom.insert(atom, name.to_owned());
        }

        Self {
            atoms: Mutex::new(atoms),
            properties: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            pixmaps: Mutex::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            broken: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent request fail as if the connection dropped.
    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn atom(
        &self,
        name: &str,
    ) -> Atom {
        let mut atoms = self.atoms.lock().unwrap();

        if let Some(&atom) = atoms.by_name.get(name) {
            return atom;
        }

        let atom = FIRST_ATOM + atoms.by_name.len() as Atom;
        atoms.by_name.insert(name.to_owned(), atom);
        atoms.by_atom.insert(atom, name.to_owned());
        atom
    }

    pub fn put(
        &self,
        window: Window,
        name: &str,
        value: Property,
    ) {
        let atom = self.atom(name);
        self.properties.lock().unwrap().insert((window, atom), value);
    }

    pub fn put_text(
        &self,
        window: Window,
        name: &str,
        text: &str,
    ) {
        let utf8_string = self.atom(property::UTF8_STRING);
        self.put(window, name, Property::from_text(utf8_string, text));
    }

    pub fn put_atoms(
        &self,
        window: Window,
        name: &str,
        names: &[&str],
    ) {
        let atoms: Vec<Atom> = names.iter().map(|name| self.atom(name)).collect();
        self.put(window, name, Property::from_u32s(property::ATOM, &atoms));
    }

    pub fn take(
        &self,
        window: Window,
        name: &str,
    ) -> Option<Property> {
        let atom = self.atom(name);
        self.properties.lock().unwrap().get(&(window, atom)).cloned()
    }

    pub fn words(
        &self,
        window: Window,
        name: &str,
    ) -> Option<Vec<u32>> {
        self.take(window, name)
            .and_then(|property| property.value32().map(|values| values.collect()))
    }

    pub fn atom_names(
        &self,
        window: Window,
        name: &str,
    ) -> Option<Vec<String>> {
        let words = self.words(window, name);
        let atoms = self.atoms.lock().unwrap();

        words.map(|words| {
            words
                .iter()
                .map(|atom| atoms.by_atom.get(atom).cloned().unwrap_or_default())
                .collect()
        })
    }

    pub fn put_pixmap(
        &self,
        pixmap: Pixmap,
        contents: Icon,
    ) {
        self.pixmaps.lock().unwrap().insert(pixmap, contents);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(anyhow!("connection to the display server was lost"))
        } else {
            Ok(())
        }
    }
}

impl Connection for FakeConnection {
    fn root(&self) -> Window {
        ROOT
    }

    fn flush(&self) -> bool {
        !self.broken.load(Ordering::SeqCst)
    }

    fn intern_atom(
        &self,
        name: &str,
    ) -> Result<Atom> {
        self.check()?;
        Ok(self.atom(name))
    }

    fn atom_name(
        &self,
        atom: Atom,
    ) -> Result<String> {
        self.check()?;

        self.atoms
            .lock()
            .unwrap()
            .by_atom
            .get(&atom)
            .cloned()
            .ok_or_else(|| crate::error::Error::UnknownAtom(atom).into())
    }

    fn get_property(
        &self,
        window: Window,
        property: Atom,
    ) -> Result<Option<Property>> {
        self.check()?;
        Ok(self.properties.lock().unwrap().get(&(window, property)).cloned())
    }

    fn set_property(
        &self,
        window: Window,
        property: Atom,
        value: &Property,
    ) -> Result<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.properties
            .lock()
            .unwrap()
            .insert((window, property), value.clone());
        Ok(())
    }

    fn send_root_message(
        &self,
        window: Window,
        type_: Atom,
        data: [u32; 5],
    ) -> Result<()> {
        let type_ = self.atom_name(type_)?;
        self.messages.lock().unwrap().push(SentMessage {
            window,
            type_,
            data,
        });
        Ok(())
    }

    fn get_pixmap(
        &self,
        pixmap: Pixmap,
    ) -> Result<Icon> {
        self.check()?;

        self.pixmaps
            .lock()
            .unwrap()
            .get(&pixmap)
            .cloned()
            .ok_or_else(|| anyhow!("no pixmap {:#x}", pixmap))
    }
}
