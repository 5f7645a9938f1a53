use crate::property::Property;
use crate::window::IcccmWindowState;
use crate::window::Pixmap;
use crate::window::Window;

use x11rb::properties;

use bitflags::bitflags;

bitflags! {
    /// Flags of a `WM_SIZE_HINTS` property.
    #[derive(Default)]
    pub struct SizeHintsFlags: u32 {
        const US_POSITION   = 0b00_0000_0001;
        const US_SIZE       = 0b00_0000_0010;
        const P_POSITION    = 0b00_0000_0100;
        const P_SIZE        = 0b00_0000_1000;
        const P_MIN_SIZE    = 0b00_0001_0000;
        const P_MAX_SIZE    = 0b00_0010_0000;
        const P_RESIZE_INC  = 0b00_0100_0000;
        const P_ASPECT      = 0b00_1000_0000;
        const P_BASE_SIZE   = 0b01_0000_0000;
        const P_WIN_GRAVITY = 0b10_0000_0000;
    }
}

bitflags! {
    /// Flags of a `WM_HINTS` property.
    #[derive(Default)]
    pub struct WmHintsFlags: u32 {
        const INPUT             = 1 << 0;
        const STATE             = 1 << 1;
        const ICON_PIXMAP       = 1 << 2;
        const ICON_WINDOW       = 1 << 3;
        const ICON_POSITION     = 1 << 4;
        const ICON_MASK         = 1 << 5;
        const WINDOW_GROUP      = 1 << 6;
        const MESSAGE           = 1 << 7;
        const URGENCY           = 1 << 8;
        // Same bit as the CWOverrideRedirect attribute mask.
        const OVERRIDE_REDIRECT = 1 << 9;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct MotifFlags: u32 {
        const FUNCTIONS   = 1 << 0;
        const DECORATIONS = 1 << 1;
        const INPUT_MODE  = 1 << 2;
        const STATUS      = 1 << 3;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct MotifDecorations: u32 {
        const ALL      = 1 << 0;
        const BORDER   = 1 << 1;
        const RESIZEH  = 1 << 2;
        const TITLE    = 1 << 3;
        const MENU     = 1 << 4;
        const MINIMIZE = 1 << 5;
        const MAXIMIZE = 1 << 6;
    }
}

/// The parts of `WM_NORMAL_HINTS` the layer works with.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SizeHints {
    pub flags: SizeHintsFlags,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub inc_width: u32,
    pub inc_height: u32,
    pub base_width: u32,
    pub base_height: u32,
}

impl SizeHints {
    /// Parses `WM_NORMAL_HINTS`, which must be typed `WM_SIZE_HINTS`.
    ///
    /// Pre-ICCCM values without base size and gravity are accepted; their
    /// base size is the minimum size.
    pub fn from_property(property: &Property) -> Option<Self> {
        properties::WmSizeHints::from_reply(&property.to_reply())
            .ok()
            .map(Self::from)
    }

    #[inline]
    pub fn min_size(&self) -> (u32, u32) {
        (self.min_width, self.min_height)
    }

    /// The base size, where an unset (zero) base falls back to the minimum.
    pub fn base_size(&self) -> (u32, u32) {
        (
            if self.base_width > 0 {
                self.base_width
            } else {
                self.min_width
            },
            if self.base_height > 0 {
                self.base_height
            } else {
                self.min_height
            },
        )
    }

    /// Snaps a requested size onto the client's resize increments.
    ///
    /// Without `P_RESIZE_INC` the request is returned as is. Each axis is
    /// otherwise moved to the nearest `base + n * inc`, ties rounding away
    /// from the base; an axis with a zero increment is left alone.
    pub fn apply_increment(
        &self,
        width: u16,
        height: u16,
    ) -> (u16, u16) {
        if !self.flags.contains(SizeHintsFlags::P_RESIZE_INC) {
            return (width, height);
        }

        let (base_width, base_height) = self.base_size();

        (
            snap(width, base_width, self.inc_width),
            snap(height, base_height, self.inc_height),
        )
    }
}

impl From<properties::WmSizeHints> for SizeHints {
    fn from(hints: properties::WmSizeHints) -> Self {
        let mut flags = SizeHintsFlags::empty();

        let mut dimensions = |value: Option<(i32, i32)>, flag: SizeHintsFlags| {
            value.map_or((0, 0), |(width, height)| {
                flags.insert(flag);
                (width.max(0) as u32, height.max(0) as u32)
            })
        };

        let (min_width, min_height) = dimensions(hints.min_size, SizeHintsFlags::P_MIN_SIZE);
        let (max_width, max_height) = dimensions(hints.max_size, SizeHintsFlags::P_MAX_SIZE);
        let (inc_width, inc_height) =
            dimensions(hints.size_increment, SizeHintsFlags::P_RESIZE_INC);
        let (base_width, base_height) = dimensions(hints.base_size, SizeHintsFlags::P_BASE_SIZE);

        Self {
            flags,
            min_width,
            min_height,
            max_width,
            max_height,
            inc_width,
            inc_height,
            base_width,
            base_height,
        }
    }
}

fn snap(
    requested: u16,
    base: u32,
    inc: u32,
) -> u16 {
    if inc == 0 {
        return requested;
    }

    let base = f64::from(base);
    let inc = f64::from(inc);

    // The difference may be negative; it must not be clamped before rounding.
    let steps = ((f64::from(requested) - base) / inc).round();
    (base + steps * inc) as u16
}

/// The parts of `WM_HINTS` the layer works with.
///
/// Decoded from the raw words rather than `x11rb::properties::WmHints`,
/// which does not keep the override-redirect bit.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Hints {
    pub flags: WmHintsFlags,
    pub urgent: bool,
    pub input: Option<bool>,
    pub initial_state: Option<IcccmWindowState>,
    pub icon_pixmap: Option<Pixmap>,
    pub icon_mask: Option<Pixmap>,
    pub group: Option<Window>,
}

impl Hints {
    pub const WM_HINTS_LEN: usize = 9;

    pub fn from_words(words: &[u32]) -> Option<Self> {
        if words.len() < Self::WM_HINTS_LEN {
            return None;
        }

        let flags = WmHintsFlags::from_bits_truncate(words[0]);

        Some(Self {
            flags,
            urgent: flags.contains(WmHintsFlags::URGENCY),
            input: if flags.contains(WmHintsFlags::INPUT) {
                Some(words[1] != 0)
            } else {
                None
            },
            initial_state: if flags.contains(WmHintsFlags::STATE) {
                IcccmWindowState::from_code(words[2])
            } else {
                None
            },
            icon_pixmap: if flags.contains(WmHintsFlags::ICON_PIXMAP) {
                Some(words[3])
            } else {
                None
            },
            icon_mask: if flags.contains(WmHintsFlags::ICON_MASK) {
                Some(words[7])
            } else {
                None
            },
            group: if flags.contains(WmHintsFlags::WINDOW_GROUP) {
                Some(words[8])
            } else {
                None
            },
        })
    }

    pub fn to_words(&self) -> Vec<u32> {
        let mut words = vec![0; Self::WM_HINTS_LEN];
        let mut flags = self.flags;

        if let Some(input) = self.input {
            flags.insert(WmHintsFlags::INPUT);
            words[1] = input as u32;
        }

        if let Some(state) = self.initial_state {
            flags.insert(WmHintsFlags::STATE);
            words[2] = state.into();
        }

        if let Some(pixmap) = self.icon_pixmap {
            flags.insert(WmHintsFlags::ICON_PIXMAP);
            words[3] = pixmap;
        }

        if let Some(mask) = self.icon_mask {
            flags.insert(WmHintsFlags::ICON_MASK);
            words[7] = mask;
        }

        if let Some(group) = self.group {
            flags.insert(WmHintsFlags::WINDOW_GROUP);
            words[8] = group;
        }

        flags.set(WmHintsFlags::URGENCY, self.urgent);
        words[0] = flags.bits();

        words
    }

    #[inline]
    pub fn override_redirect(&self) -> bool {
        self.flags.contains(WmHintsFlags::OVERRIDE_REDIRECT)
    }
}

/// `_MOTIF_WM_HINTS`, as set by toolkits that draw their own decorations.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MotifHints {
    pub flags: MotifFlags,
    pub functions: u32,
    pub decorations: MotifDecorations,
    pub input_mode: u32,
    pub status: u32,
}

impl MotifHints {
    pub const MOTIF_HINTS_LEN: usize = 5;

    pub fn from_words(words: &[u32]) -> Option<Self> {
        if words.len() < Self::MOTIF_HINTS_LEN {
            return None;
        }

        Some(Self {
            flags: MotifFlags::from_bits_truncate(words[0]),
            functions: words[1],
            decorations: MotifDecorations::from_bits_truncate(words[2]),
            input_mode: words[3],
            status: words[4],
        })
    }

    pub fn to_words(&self) -> Vec<u32> {
        vec![
            self.flags.bits(),
            self.functions,
            self.decorations.bits(),
            self.input_mode,
            self.status,
        ]
    }

    /// Whether the client asks for a window manager frame.
    pub fn decorated(&self) -> bool {
        if !self.flags.contains(MotifFlags::DECORATIONS) {
            return true;
        }

        self.decorations.intersects(
            MotifDecorations::ALL | MotifDecorations::TITLE | MotifDecorations::RESIZEH,
        )
    }
}
