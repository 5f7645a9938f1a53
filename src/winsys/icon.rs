//! Window icon lookup, background pre-blending and PNG serialization

use crate::connection::Connection;
use crate::error::Error;
use crate::property::WM_HINTS;
use crate::property::_NET_WM_ICON;
use crate::reader::PropertyReader;
use crate::window::Window;
use crate::Result;

use std::borrow::Cow;

/// An opaque colour the icon is pre-blended against.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(
        r: u8,
        g: u8,
        b: u8,
    ) -> Self {
        Self {
            r,
            g,
            b,
        }
    }
}

impl From<u32> for Rgb {
    fn from(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }
}

/// One entry of `_NET_WM_ICON`: row-major ARGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Icon {
    /// Entries above this many pixels are treated as garbage.
    pub const MAX_ICON_PIXELS: usize = 1024 * 1024;

    /// Splits a `_NET_WM_ICON` value into its entries, stopping at the first
    /// truncated, empty or oversized one.
    pub fn parse_all(mut words: &[u32]) -> Vec<Icon> {
        let mut icons = Vec::new();

        while words.len() >= 2 {
            let (width, height) = (words[0], words[1]);
            let count = (width as usize).saturating_mul(height as usize);

            if count == 0 || count > Self::MAX_ICON_PIXELS || words.len() - 2 < count {
                break;
            }

            icons.push(Icon {
                width,
                height,
                pixels: words[2..2 + count].to_vec(),
            });

            words = &words[2 + count..];
        }

        icons
    }

    /// Picks the icon whose area is closest to `width * height`, preferring
    /// the larger one when two are equally close.
    pub fn best_match(
        icons: &[Icon],
        width: u32,
        height: u32,
    ) -> Option<&Icon> {
        let preferred = i128::from(width) * i128::from(height);

        icons.iter().fold(None, |best: Option<&Icon>, icon| match best {
            None => Some(icon),
            Some(best) => {
                let (best_area, icon_area) = (best.area(), icon.area());
                let (best_diff, icon_diff) =
                    ((preferred - best_area).abs(), (preferred - icon_area).abs());

                if icon_diff < best_diff || (icon_diff == best_diff && icon_area > best_area) {
                    Some(icon)
                } else {
                    Some(best)
                }
            },
        })
    }

    #[inline]
    fn area(&self) -> i128 {
        i128::from(self.width) * i128::from(self.height)
    }

    /// Nearest-neighbour resample.
    pub fn scale(
        &self,
        width: u32,
        height: u32,
    ) -> Icon {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);

        for y in 0..u64::from(height) {
            let src_y = y * u64::from(self.height) / u64::from(height);

            for x in 0..u64::from(width) {
                let src_x = x * u64::from(self.width) / u64::from(width);
                pixels.push(self.pixels[(src_y * u64::from(self.width) + src_x) as usize]);
            }
        }

        Icon {
            width,
            height,
            pixels,
        }
    }

    /// Mixes every pixel's colour with `background` in proportion to the
    /// pixel's alpha. The background layer has zero alpha, so each pixel
    /// keeps its own alpha.
    pub fn blend_background(
        &mut self,
        background: Rgb,
    ) {
        for pixel in self.pixels.iter_mut() {
            let alpha = (*pixel >> 24) as u8;
            let r = blend((*pixel >> 16) as u8, background.r, alpha);
            let g = blend((*pixel >> 8) as u8, background.g, alpha);
            let b = blend(*pixel as u8, background.b, alpha);

            *pixel = u32::from(alpha) << 24
                | u32::from(r) << 16
                | u32::from(g) << 8
                | u32::from(b);
        }
    }

    /// Clears the alpha of every pixel that is black in `mask`, stretching
    /// the mask first if its size differs.
    pub fn apply_mask(
        &mut self,
        mask: &Icon,
    ) {
        if mask.pixels.is_empty() {
            return;
        }

        let mask = if (mask.width, mask.height) == (self.width, self.height) {
            Cow::Borrowed(mask)
        } else {
            Cow::Owned(mask.scale(self.width, self.height))
        };

        for (pixel, &bit) in self.pixels.iter_mut().zip(&mask.pixels) {
            if bit & 0x00ff_ffff == 0 {
                *pixel &= 0x00ff_ffff;
            }
        }
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&pixel| {
                vec![
                    (pixel >> 16) as u8,
                    (pixel >> 8) as u8,
                    pixel as u8,
                    (pixel >> 24) as u8,
                ]
            })
            .collect()
    }

    pub fn encode_png(&self) -> std::result::Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();

        let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba())?;
        writer.finish()?;

        Ok(buffer)
    }
}

#[inline]
fn blend(
    fg: u8,
    bg: u8,
    alpha: u8,
) -> u8 {
    let alpha = u32::from(alpha);
    ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
}

/// Fetches the window's icon at roughly `width` x `height`, pre-blended
/// against `background`, as PNG bytes.
///
/// A window without a usable icon is a normal outcome: the failure is
/// logged and an empty buffer returned.
pub fn extract<C: Connection>(
    conn: &C,
    window: Window,
    width: u32,
    height: u32,
    background: Rgb,
) -> Vec<u8> {
    match fetch(conn, window, width, height, background) {
        Ok(png) => png,
        Err(err) => {
            warn!("could not get icon for window {:#0x}: {}", window, err);
            Vec::with_capacity(0)
        },
    }
}

fn fetch<C: Connection>(
    conn: &C,
    window: Window,
    width: u32,
    height: u32,
    background: Rgb,
) -> Result<Vec<u8>> {
    if u64::from(width) * u64::from(height) > Icon::MAX_ICON_PIXELS as u64 {
        return Err(Error::IconSize {
            width,
            height,
        }
        .into());
    }

    let mut icon = match extended_icon(conn, window, width, height) {
        Ok(icon) => icon,
        Err(err) => {
            debug!("trying {} icon of window {:#0x}: {}", WM_HINTS, window, err);
            legacy_icon(conn, window)?
        },
    };

    if width != 0 && height != 0 && (icon.width != width || icon.height != height) {
        debug!(
            "scaling {}x{} icon of window {:#0x} to {}x{}",
            icon.width, icon.height, window, width, height
        );

        icon = icon.scale(width, height);
    }

    icon.blend_background(background);
    Ok(icon.encode_png()?)
}

fn extended_icon<C: Connection>(
    conn: &C,
    window: Window,
    width: u32,
    height: u32,
) -> Result<Icon> {
    let words = PropertyReader::new(conn).words(window, _NET_WM_ICON)?;
    let icons = Icon::parse_all(&words);

    Icon::best_match(&icons, width, height)
        .cloned()
        .ok_or_else(|| Error::NoIcon(window).into())
}

/// The `WM_HINTS` icon pixmap, with its mask applied when one is given.
fn legacy_icon<C: Connection>(
    conn: &C,
    window: Window,
) -> Result<Icon> {
    let hints = PropertyReader::new(conn)
        .wm_hints(window)
        .ok_or(Error::NoIcon(window))?;

    let mut icon = conn.get_pixmap(hints.icon_pixmap.ok_or(Error::NoIcon(window))?)?;

    if let Some(mask) = hints.icon_mask {
        icon.apply_mask(&conn.get_pixmap(mask)?);
    }

    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fake::FakeConnection;
    use crate::hints::Hints;
    use crate::property::Property;
    use crate::property::CARDINAL;

    const WINDOW: Window = 0x400001;

    fn decode(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buffer = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buffer).unwrap();

        buffer.truncate(info.buffer_size());
        (info.width, info.height, buffer)
    }

    fn icon_words() -> Vec<u32> {
        let mut words = vec![1, 1, 0xff00_00ff];
        words.extend_from_slice(&[2, 2, 0xffff_0000, 0x00ff_ffff, 0x8000_0000, 0xff00_ff00]);
        words
    }

    #[test]
    fn parse_stops_at_truncated_entry() {
        let mut words = icon_words();
        words.extend_from_slice(&[16, 16, 0, 0]);

        let icons = Icon::parse_all(&words);

        assert_eq!(icons.len(), 2);
        assert_eq!((icons[0].width, icons[0].height), (1, 1));
        assert_eq!(icons[1].pixels, vec![0xffff_0000, 0x00ff_ffff, 0x8000_0000, 0xff00_ff00]);
        assert!(Icon::parse_all(&[0, 0, 1]).is_empty());
    }

    #[test]
    fn best_match_is_closest_area_ties_to_larger() {
        let icon = |size: u32| Icon {
            width: size,
            height: size,
            pixels: vec![0; (size * size) as usize],
        };

        let icons = vec![icon(2), icon(4), icon(5)];

        assert_eq!(Icon::best_match(&icons, 4, 4).map(|icon| icon.width), Some(4));
        assert_eq!(Icon::best_match(&icons, 1, 1).map(|icon| icon.width), Some(2));
        assert_eq!(Icon::best_match(&icons, 64, 64).map(|icon| icon.width), Some(5));
        assert_eq!(Icon::best_match(&icons[..2], 10, 1).map(|icon| icon.width), Some(4));
        assert_eq!(Icon::best_match(&[], 4, 4), None);
    }

    #[test]
    fn blending_keeps_alpha() {
        let mut icon = Icon {
            width: 3,
            height: 1,
            pixels: vec![0xff11_2233, 0x00ff_ffff, 0x80ff_0000],
        };

        icon.blend_background(Rgb::new(0x00, 0x00, 0xff));

        assert_eq!(icon.pixels[0], 0xff11_2233);
        assert_eq!(icon.pixels[1], 0x0000_00ff);
        assert_eq!(icon.pixels[2], 0x8080_007f);
    }

    #[test]
    fn scaling_is_nearest_neighbour() {
        let icon = Icon {
            width: 2,
            height: 1,
            pixels: vec![1, 2],
        };

        assert_eq!(icon.scale(4, 2).pixels, vec![1, 1, 2, 2, 1, 1, 2, 2]);
        assert_eq!(icon.scale(1, 1).pixels, vec![1]);
    }

    #[test]
    fn extract_encodes_best_icon_as_png() {
        let conn = FakeConnection::new();
        conn.put(WINDOW, _NET_WM_ICON, Property::from_u32s(CARDINAL, &icon_words()));

        let png = extract(&conn, WINDOW, 2, 2, Rgb::from(0x0000ff));
        let (width, height, rgba) = decode(&png);

        assert_eq!((width, height), (2, 2));
        assert_eq!(&rgba[0..4], &[0xff, 0x00, 0x00, 0xff]);
        assert_eq!(&rgba[4..8], &[0x00, 0x00, 0xff, 0x00]);
        assert_eq!(&rgba[8..12], &[0x00, 0x00, 0x7f, 0x80]);
    }

    #[test]
    fn extract_scales_to_requested_size() {
        let conn = FakeConnection::new();
        conn.put(WINDOW, _NET_WM_ICON, Property::from_u32s(CARDINAL, &icon_words()));

        let (width, height, _) = decode(&extract(&conn, WINDOW, 8, 8, Rgb::default()));
        assert_eq!((width, height), (8, 8));
    }

    #[test]
    fn missing_or_malformed_icon_is_empty() {
        let conn = FakeConnection::new();
        assert!(extract(&conn, WINDOW, 16, 16, Rgb::default()).is_empty());

        conn.put(WINDOW, _NET_WM_ICON, Property::from_bytes(CARDINAL, b"nope"));
        assert!(extract(&conn, WINDOW, 16, 16, Rgb::default()).is_empty());

        conn.put(WINDOW, _NET_WM_ICON, Property::from_u32s(CARDINAL, &[4, 4, 0]));
        assert!(extract(&conn, WINDOW, 16, 16, Rgb::default()).is_empty());
    }

    #[test]
    fn oversized_requests_are_empty() {
        let conn = FakeConnection::new();
        conn.put(WINDOW, _NET_WM_ICON, Property::from_u32s(CARDINAL, &[1, 1, 0xff00_00ff]));

        assert!(extract(&conn, WINDOW, u32::MAX, u32::MAX, Rgb::default()).is_empty());
        assert!(extract(&conn, WINDOW, 70_000, 70_000, Rgb::default()).is_empty());
        assert!(!extract(&conn, WINDOW, 1, 1, Rgb::default()).is_empty());
    }

    #[test]
    fn best_match_handles_extreme_sizes() {
        let icons = Icon::parse_all(&icon_words());

        assert_eq!(
            Icon::best_match(&icons, u32::MAX, u32::MAX).map(|icon| icon.width),
            Some(2)
        );
    }

    fn legacy_hints(mask: Option<u32>) -> Property {
        let hints = Hints {
            icon_pixmap: Some(0x300),
            icon_mask: mask,
            ..Hints::default()
        };

        Property::from_u32s(CARDINAL, &hints.to_words())
    }

    fn put_legacy_pixmaps(conn: &FakeConnection) {
        conn.put_pixmap(0x300, Icon {
            width: 2,
            height: 1,
            pixels: vec![0xffff_0000, 0xff00_ff00],
        });

        conn.put_pixmap(0x301, Icon {
            width: 2,
            height: 1,
            pixels: vec![0xffff_ffff, 0xff00_0000],
        });
    }

    #[test]
    fn legacy_pixmap_is_used_without_extended_icon() {
        let conn = FakeConnection::new();
        put_legacy_pixmaps(&conn);
        conn.put(WINDOW, WM_HINTS, legacy_hints(None));

        let (width, height, rgba) = decode(&extract(&conn, WINDOW, 0, 0, Rgb::default()));

        assert_eq!((width, height), (2, 1));
        assert_eq!(rgba, vec![0xff, 0x00, 0x00, 0xff, 0x00, 0xff, 0x00, 0xff]);
    }

    #[test]
    fn legacy_mask_clears_alpha() {
        let conn = FakeConnection::new();
        put_legacy_pixmaps(&conn);
        conn.put(WINDOW, WM_HINTS, legacy_hints(Some(0x301)));

        let (_, _, rgba) = decode(&extract(&conn, WINDOW, 0, 0, Rgb::new(0x00, 0x00, 0xff)));

        assert_eq!(&rgba[0..4], &[0xff, 0x00, 0x00, 0xff]);
        assert_eq!(&rgba[4..8], &[0x00, 0x00, 0xff, 0x00]);
    }

    #[test]
    fn extended_icon_wins_over_legacy_pixmap() {
        let conn = FakeConnection::new();
        put_legacy_pixmaps(&conn);
        conn.put(WINDOW, WM_HINTS, legacy_hints(Some(0x301)));
        conn.put(WINDOW, _NET_WM_ICON, Property::from_u32s(CARDINAL, &[1, 1, 0xff00_00ff]));

        let (width, height, rgba) = decode(&extract(&conn, WINDOW, 0, 0, Rgb::default()));

        assert_eq!((width, height), (1, 1));
        assert_eq!(rgba, vec![0x00, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn missing_legacy_pixmap_is_empty() {
        let conn = FakeConnection::new();
        conn.put(WINDOW, WM_HINTS, legacy_hints(None));

        assert!(extract(&conn, WINDOW, 16, 16, Rgb::default()).is_empty());
    }

    #[test]
    fn mask_is_stretched_to_the_icon() {
        let mut icon = Icon {
            width: 2,
            height: 2,
            pixels: vec![0xff11_1111; 4],
        };

        icon.apply_mask(&Icon {
            width: 1,
            height: 2,
            pixels: vec![0xffff_ffff, 0xff00_0000],
        });

        assert_eq!(icon.pixels, vec![0xff11_1111, 0xff11_1111, 0x0011_1111, 0x0011_1111]);
    }
}
