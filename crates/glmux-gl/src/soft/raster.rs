//! Pixel storage for the software context: RGBA8 images plus upload/readback conversions.

use crate::webgl::{LUMINANCE, LUMINANCE_ALPHA};

/// A level-0 colour image. Rows are stored bottom-up, matching GL window coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Image {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[u8; 4]>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.texels[i])
    }

    /// Writes `rgba` through the channel write mask. Out-of-bounds writes are dropped.
    pub fn put(&mut self, x: i32, y: i32, rgba: [u8; 4], mask: [bool; 4]) {
        if let Some(i) = self.index(x, y) {
            let texel = &mut self.texels[i];
            for c in 0..4 {
                if mask[c] {
                    texel[c] = rgba[c];
                }
            }
        }
    }
}

/// Axis-aligned pixel rectangle, `x0..x1` by `y0..y1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(w.max(0)),
            y1: y.saturating_add(h.max(0)),
        }
    }

    pub fn intersect(self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

pub(crate) fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn rgba8(v: [f32; 4]) -> [u8; 4] {
    [unorm8(v[0]), unorm8(v[1]), unorm8(v[2]), unorm8(v[3])]
}

/// Bytes per pixel for the supported upload `format`/`ty` pairs.
pub(crate) fn bytes_per_pixel(format: u32, ty: u32) -> Option<usize> {
    let channels = match format {
        glow::RGBA => 4,
        glow::RGB => 3,
        LUMINANCE_ALPHA | glow::RG => 2,
        glow::ALPHA | LUMINANCE | glow::RED => 1,
        _ => return None,
    };
    let size = match ty {
        glow::UNSIGNED_BYTE => 1,
        glow::FLOAT => 4,
        _ => return None,
    };
    Some(channels * size)
}

/// Upload options taken from `pixel_store_i32` state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Unpack {
    pub alignment: usize,
    pub flip_y: bool,
    pub premultiply_alpha: bool,
}

/// Readback layout taken from the `PACK_*` pixel-store state. Output is always RGBA8.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pack {
    pub alignment: usize,
    pub row_length: usize,
    pub skip_pixels: usize,
    pub skip_rows: usize,
}

impl Pack {
    pub const TIGHT: Pack = Pack {
        alignment: 1,
        row_length: 0,
        skip_pixels: 0,
        skip_rows: 0,
    };

    /// Byte offset of the first pixel and the stride between rows.
    pub fn layout(&self, width: usize) -> (usize, usize) {
        let row_pixels = if self.row_length > 0 { self.row_length } else { width };
        let alignment = self.alignment.max(1);
        let stride = (row_pixels * 4).div_ceil(alignment) * alignment;
        (self.skip_rows * stride + self.skip_pixels * 4, stride)
    }

    /// Bytes a `width` x `height` readback writes through.
    pub fn required_len(&self, width: usize, height: usize) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        let (offset, stride) = self.layout(width);
        offset + stride * (height - 1) + width * 4
    }
}

/// Decodes client pixels into RGBA8 texels. Returns `None` when `data` is too short.
pub(crate) fn unpack_texels(
    format: u32,
    ty: u32,
    width: u32,
    height: u32,
    data: &[u8],
    unpack: Unpack,
) -> Option<Vec<[u8; 4]>> {
    let bpp = bytes_per_pixel(format, ty)?;
    let row_bytes = bpp * width as usize;
    let alignment = unpack.alignment.max(1);
    let stride = row_bytes.div_ceil(alignment) * alignment;
    let needed = if height == 0 {
        0
    } else {
        stride * (height as usize - 1) + row_bytes
    };
    if data.len() < needed {
        return None;
    }

    let channel = |px: &[u8], c: usize| -> u8 {
        match ty {
            glow::FLOAT => {
                let b = &px[c * 4..c * 4 + 4];
                unorm8(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            _ => px[c],
        }
    };

    let mut out = Vec::with_capacity(width as usize * height as usize);
    for row in 0..height as usize {
        let src_row = if unpack.flip_y {
            height as usize - 1 - row
        } else {
            row
        };
        let base = src_row * stride;
        for col in 0..width as usize {
            let px = &data[base + col * bpp..base + (col + 1) * bpp];
            let mut texel = match format {
                glow::RGBA => [channel(px, 0), channel(px, 1), channel(px, 2), channel(px, 3)],
                glow::RGB => [channel(px, 0), channel(px, 1), channel(px, 2), 255],
                glow::RG => [channel(px, 0), channel(px, 1), 0, 255],
                glow::RED => [channel(px, 0), 0, 0, 255],
                LUMINANCE_ALPHA => {
                    let l = channel(px, 0);
                    [l, l, l, channel(px, 1)]
                }
                LUMINANCE => {
                    let l = channel(px, 0);
                    [l, l, l, 255]
                }
                _ => [0, 0, 0, channel(px, 0)],
            };
            if unpack.premultiply_alpha {
                let a = u16::from(texel[3]);
                for c in texel.iter_mut().take(3) {
                    *c = ((u16::from(*c) * a + 127) / 255) as u8;
                }
            }
            out.push(texel);
        }
    }
    Some(out)
}

/// Nearest-neighbour colour copy between two images, as done by `blitFramebuffer`.
pub(crate) fn blit_nearest(src: &Image, src_rect: Rect, dst: &mut Image, dst_rect: Rect) {
    let dw = dst_rect.x1 - dst_rect.x0;
    let dh = dst_rect.y1 - dst_rect.y0;
    if dw == 0 || dh == 0 {
        return;
    }
    let sw = (src_rect.x1 - src_rect.x0) as f32;
    let sh = (src_rect.y1 - src_rect.y0) as f32;
    for dy in 0..dh.abs() {
        for dx in 0..dw.abs() {
            let u = (dx as f32 + 0.5) / dw.abs() as f32;
            let v = (dy as f32 + 0.5) / dh.abs() as f32;
            let (u, v) = (
                if dw < 0 { 1.0 - u } else { u },
                if dh < 0 { 1.0 - v } else { v },
            );
            let sx = src_rect.x0 + (u * sw).floor() as i32;
            let sy = src_rect.y0 + (v * sh).floor() as i32;
            if let Some(texel) = src.get(sx, sy) {
                let x = dst_rect.x0.min(dst_rect.x1) + dx;
                let y = dst_rect.y0.min(dst_rect.y1) + dy;
                dst.put(x, y, texel, [true; 4]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIGHT: Unpack = Unpack {
        alignment: 1,
        flip_y: false,
        premultiply_alpha: false,
    };

    #[test]
    fn rgb_rows_honour_unpack_alignment() {
        // 1x2 RGB image: each 3-byte row is padded to 4 bytes.
        let data = [255, 0, 0, 0, 0, 255, 0];
        let unpack = Unpack {
            alignment: 4,
            ..TIGHT
        };
        let texels = unpack_texels(glow::RGB, glow::UNSIGNED_BYTE, 1, 2, &data, unpack).unwrap();
        assert_eq!(texels, vec![[255, 0, 0, 255], [0, 255, 0, 255]]);
    }

    #[test]
    fn short_uploads_are_rejected() {
        assert!(unpack_texels(glow::RGBA, glow::UNSIGNED_BYTE, 2, 2, &[0; 15], TIGHT).is_none());
    }

    #[test]
    fn flip_y_and_premultiply() {
        let data = [255, 255, 255, 128, 10, 20, 30, 255];
        let unpack = Unpack {
            alignment: 4,
            flip_y: true,
            premultiply_alpha: true,
        };
        let texels = unpack_texels(glow::RGBA, glow::UNSIGNED_BYTE, 1, 2, &data, unpack).unwrap();
        assert_eq!(texels, vec![[10, 20, 30, 255], [128, 128, 128, 128]]);
    }

    #[test]
    fn masked_writes_keep_disabled_channels() {
        let mut image = Image::new(1, 1);
        image.put(0, 0, [9, 9, 9, 9], [true, false, true, false]);
        assert_eq!(image.get(0, 0), Some([9, 0, 9, 0]));
        image.put(5, 5, [1; 4], [true; 4]);
        assert_eq!(image.get(5, 5), None);
    }

    #[test]
    fn blit_copies_scaled_region() {
        let mut src = Image::new(2, 1);
        src.put(0, 0, [255, 0, 0, 255], [true; 4]);
        src.put(1, 0, [0, 255, 0, 255], [true; 4]);
        let mut dst = Image::new(4, 1);
        blit_nearest(&src, Rect::from_xywh(0, 0, 2, 1), &mut dst, Rect::from_xywh(0, 0, 4, 1));
        assert_eq!(dst.get(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.get(2, 0), Some([0, 255, 0, 255]));
    }
}
