//! Fragment generation for `SoftGl`: clears, point rasterization, readback and blits.

use tracing::trace;

use crate::handles::{FramebufferId, RenderbufferId, TextureId};
use crate::physical::VertexAttribValue;

use super::objects::{Attachment, UniformValue, VertexArrayState};
use super::raster::{self, Image, Pack, Rect};
use super::shader::FragmentOutput;
use super::SoftGl;

/// A colour image that draws or reads can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ColorSurface {
    Default,
    Texture {
        texture: TextureId,
        image_target: u32,
        level: i32,
    },
    Renderbuffer(RenderbufferId),
}

impl From<Attachment> for ColorSurface {
    fn from(attachment: Attachment) -> Self {
        match attachment {
            Attachment::Texture {
                texture,
                image_target,
                level,
            } => ColorSurface::Texture {
                texture,
                image_target,
                level,
            },
            Attachment::Renderbuffer(rb) => ColorSurface::Renderbuffer(rb),
        }
    }
}

/// Vertex source of a draw call.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Vertices {
    Range { first: i32, count: i32 },
    Elements { count: i32, ty: u32, offset: i32 },
}

impl Vertices {
    fn count(self) -> i32 {
        match self {
            Vertices::Range { count, .. } | Vertices::Elements { count, .. } => count,
        }
    }
}

fn component_size(data_type: u32) -> usize {
    match data_type {
        glow::BYTE | glow::UNSIGNED_BYTE => 1,
        glow::SHORT | glow::UNSIGNED_SHORT | glow::HALF_FLOAT => 2,
        _ => 4,
    }
}

fn decode_component(data_type: u32, normalized: bool, bytes: &[u8]) -> f32 {
    let (value, max) = match data_type {
        glow::FLOAT => return f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        glow::UNSIGNED_BYTE => (f32::from(bytes[0]), f32::from(u8::MAX)),
        glow::BYTE => (f32::from(bytes[0] as i8), f32::from(i8::MAX)),
        glow::UNSIGNED_SHORT => (
            f32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            f32::from(u16::MAX),
        ),
        glow::SHORT => (
            f32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            f32::from(i16::MAX),
        ),
        glow::UNSIGNED_INT => (
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            u32::MAX as f32,
        ),
        _ => (
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            i32::MAX as f32,
        ),
    };
    if normalized {
        (value / max).max(-1.0)
    } else {
        value
    }
}

fn attrib_as_f32(value: VertexAttribValue) -> [f32; 4] {
    match value {
        VertexAttribValue::Float(v) => v,
        VertexAttribValue::Int(v) => v.map(|c| c as f32),
        VertexAttribValue::Uint(v) => v.map(|c| c as f32),
    }
}

impl SoftGl {
    pub(super) fn vao(&self) -> &VertexArrayState {
        self.state
            .vertex_array
            .and_then(|id| self.vertex_arrays.get(&id))
            .unwrap_or(&self.state.default_vertex_array)
    }

    pub(super) fn vao_mut(&mut self) -> &mut VertexArrayState {
        let Self {
            state,
            vertex_arrays,
            ..
        } = self;
        match state.vertex_array.and_then(|id| vertex_arrays.get_mut(&id)) {
            Some(vao) => vao,
            None => &mut state.default_vertex_array,
        }
    }

    pub(super) fn surface_image(&self, surface: ColorSurface) -> Option<&Image> {
        match surface {
            ColorSurface::Default => Some(&self.default_color),
            ColorSurface::Texture {
                texture,
                image_target,
                level: 0,
            } => self.textures.get(&texture)?.images.get(&image_target),
            ColorSurface::Texture { .. } => None,
            ColorSurface::Renderbuffer(rb) => self.renderbuffers.get(&rb).map(|r| &r.image),
        }
    }

    pub(super) fn surface_image_mut(&mut self, surface: ColorSurface) -> Option<&mut Image> {
        match surface {
            ColorSurface::Default => Some(&mut self.default_color),
            ColorSurface::Texture {
                texture,
                image_target,
                level: 0,
            } => self.textures.get_mut(&texture)?.images.get_mut(&image_target),
            ColorSurface::Texture { .. } => None,
            ColorSurface::Renderbuffer(rb) => {
                self.renderbuffers.get_mut(&rb).map(|r| &mut r.image)
            }
        }
    }

    /// Colour images written by draws and clears, per the current draw-buffer selection.
    pub(super) fn draw_surfaces(&self) -> Vec<ColorSurface> {
        match self.state.draw_framebuffer {
            None => {
                if self.default_draw_buffer == glow::BACK {
                    vec![ColorSurface::Default]
                } else {
                    Vec::new()
                }
            }
            Some(id) => {
                let Some(fb) = self.framebuffers.get(&id) else {
                    return Vec::new();
                };
                fb.draw_buffers
                    .iter()
                    .enumerate()
                    .filter(|(i, buf)| **buf == glow::COLOR_ATTACHMENT0 + *i as u32)
                    .filter_map(|(_, buf)| fb.attachments.get(buf).copied())
                    .map(ColorSurface::from)
                    .collect()
            }
        }
    }

    /// The colour image selected by the read framebuffer's read buffer.
    pub(super) fn read_surface(&self) -> Result<ColorSurface, u32> {
        match self.state.read_framebuffer {
            None if self.default_read_buffer == glow::BACK => Ok(ColorSurface::Default),
            None => Err(glow::INVALID_OPERATION),
            Some(id) => {
                let fb = self.framebuffers.get(&id).ok_or(glow::INVALID_OPERATION)?;
                if self.framebuffer_status(Some(id)) != glow::FRAMEBUFFER_COMPLETE {
                    return Err(glow::INVALID_FRAMEBUFFER_OPERATION);
                }
                fb.attachments
                    .get(&fb.read_buffer)
                    .copied()
                    .map(ColorSurface::from)
                    .ok_or(glow::INVALID_OPERATION)
            }
        }
    }

    pub(super) fn framebuffer_status(&self, framebuffer: Option<FramebufferId>) -> u32 {
        let Some(id) = framebuffer else {
            return glow::FRAMEBUFFER_COMPLETE;
        };
        let Some(fb) = self.framebuffers.get(&id) else {
            return glow::FRAMEBUFFER_UNSUPPORTED;
        };
        if fb.attachments.is_empty() {
            return glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }
        let complete = fb.attachments.values().all(|a| {
            self.surface_image(ColorSurface::from(*a))
                .is_some_and(|img| img.width > 0 && img.height > 0)
        });
        if complete {
            glow::FRAMEBUFFER_COMPLETE
        } else {
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        }
    }

    fn scissor_rect(&self) -> Option<Rect> {
        self.state.enabled.contains(&glow::SCISSOR_TEST).then(|| {
            let [x, y, w, h] = self.state.scissor;
            Rect::from_xywh(x, y, w, h)
        })
    }

    pub(super) fn clear_color_buffers(&mut self) {
        if self.state.enabled.contains(&glow::RASTERIZER_DISCARD) {
            return;
        }
        let color = raster::rgba8(self.state.clear_color);
        let mask = self.state.color_mask;
        let scissor = self.scissor_rect();
        for surface in self.draw_surfaces() {
            let Some(image) = self.surface_image_mut(surface) else {
                continue;
            };
            let mut rect = Rect::from_xywh(0, 0, image.width as i32, image.height as i32);
            if let Some(scissor) = scissor {
                rect = rect.intersect(scissor);
            }
            for y in rect.y0..rect.y1 {
                for x in rect.x0..rect.x1 {
                    image.put(x, y, color, mask);
                }
            }
        }
    }

    fn fetch_attrib(&self, location: u32, vertex: u32, instance: u32) -> [f32; 4] {
        let current = attrib_as_f32(
            self.state
                .current_attribs
                .get(location as usize)
                .copied()
                .unwrap_or_default(),
        );
        let Some(ptr) = self.vao().attribs.get(location as usize) else {
            return current;
        };
        if !ptr.enabled {
            return current;
        }
        let Some(data) = ptr.buffer.and_then(|b| self.buffers.get(&b)) else {
            return current;
        };
        let index = if ptr.divisor == 0 {
            vertex
        } else {
            instance / ptr.divisor
        };
        let comp = component_size(ptr.data_type);
        let size = ptr.size.clamp(1, 4) as usize;
        let stride = if ptr.stride == 0 {
            size * comp
        } else {
            ptr.stride as usize
        };
        let base = ptr.offset.max(0) as usize + index as usize * stride;
        let mut out = [0.0, 0.0, 0.0, 1.0];
        for (c, slot) in out.iter_mut().enumerate().take(size) {
            let at = base + c * comp;
            let Some(bytes) = data.get(at..at + comp) else {
                return current;
            };
            *slot = decode_component(ptr.data_type, ptr.normalized && !ptr.integer, bytes);
        }
        out
    }

    fn element_indices(&self, count: i32, ty: u32, offset: i32) -> Result<Vec<u32>, u32> {
        let buffer = self.vao().element_array.ok_or(glow::INVALID_OPERATION)?;
        let data = self.buffers.get(&buffer).ok_or(glow::INVALID_OPERATION)?;
        let size = match ty {
            glow::UNSIGNED_BYTE => 1,
            glow::UNSIGNED_SHORT => 2,
            glow::UNSIGNED_INT => 4,
            _ => return Err(glow::INVALID_ENUM),
        };
        if offset < 0 || offset as usize % size != 0 {
            return Err(glow::INVALID_OPERATION);
        }
        let start = offset as usize;
        let end = start + count as usize * size;
        let bytes = data.get(start..end).ok_or(glow::INVALID_OPERATION)?;
        Ok(bytes
            .chunks_exact(size)
            .map(|b| match size {
                1 => u32::from(b[0]),
                2 => u32::from(u16::from_le_bytes([b[0], b[1]])),
                _ => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            })
            .collect())
    }

    fn fragment_color(&self, vertex: u32, instance: u32) -> [u8; 4] {
        let Some(program) = self.state.program.and_then(|p| self.programs.get(&p)) else {
            return [0; 4];
        };
        let Some(linked) = program.linked.as_ref() else {
            return [0; 4];
        };
        match linked.output {
            FragmentOutput::Texture { sampler } => {
                let unit = sampler
                    .and_then(|i| program.uniform_values.get(&i))
                    .map_or(0, |v| match v {
                        UniformValue::Int(unit) => *unit as usize,
                        UniformValue::Floats(f) => f.first().copied().unwrap_or(0.0) as usize,
                    });
                self.state
                    .units
                    .get(unit)
                    .and_then(|u| u.tex_2d)
                    .and_then(|t| self.textures.get(&t))
                    .and_then(|t| t.images.get(&glow::TEXTURE_2D))
                    .and_then(|img| img.get(0, 0))
                    .unwrap_or([0, 0, 0, 255])
            }
            FragmentOutput::Uniform(index) => match program.uniform_values.get(&index) {
                Some(UniformValue::Floats(f)) if f.len() >= 4 => {
                    raster::rgba8([f[0], f[1], f[2], f[3]])
                }
                _ => [0; 4],
            },
            FragmentOutput::Attribute(location) => {
                raster::rgba8(self.fetch_attrib(location, vertex, instance))
            }
            FragmentOutput::Constant(color) => color,
        }
    }

    /// Runs the vertex/fragment model over `indices`, producing window-space fragments.
    fn shade_points(&self, indices: &[u32], instances: u32) -> Vec<(i32, i32, [u8; 4])> {
        let position = self
            .state
            .program
            .and_then(|p| self.programs.get(&p))
            .and_then(|p| p.linked.as_ref())
            .and_then(|l| l.position);
        let [vx, vy, vw, vh] = self.state.viewport;
        let viewport = Rect::from_xywh(vx, vy, vw, vh);
        let scissor = self.scissor_rect();

        let mut fragments = Vec::new();
        for instance in 0..instances {
            for &vertex in indices {
                let pos = position.map_or([0.0, 0.0, 0.0, 1.0], |loc| {
                    self.fetch_attrib(loc, vertex, instance)
                });
                if pos[3] == 0.0 {
                    continue;
                }
                let (nx, ny) = (pos[0] / pos[3], pos[1] / pos[3]);
                if !(-1.0..=1.0).contains(&nx) || !(-1.0..=1.0).contains(&ny) {
                    continue;
                }
                let wx = vx as f32 + (nx + 1.0) * vw as f32 / 2.0;
                let wy = vy as f32 + (ny + 1.0) * vh as f32 / 2.0;
                let px = (wx.floor() as i32).min(viewport.x1 - 1);
                let py = (wy.floor() as i32).min(viewport.y1 - 1);
                if scissor.is_some_and(|s| !s.contains(px, py)) {
                    continue;
                }
                fragments.push((px, py, self.fragment_color(vertex, instance)));
            }
        }
        fragments
    }

    pub(super) fn draw(&mut self, mode: u32, vertices: Vertices, instances: i32) {
        if mode > glow::TRIANGLE_FAN {
            self.record(glow::INVALID_ENUM);
            return;
        }
        if vertices.count() < 0 || instances < 0 {
            self.record(glow::INVALID_VALUE);
            return;
        }
        let linked = self
            .state
            .program
            .and_then(|p| self.programs.get(&p))
            .is_some_and(|p| p.linked.is_some());
        if !linked {
            self.record(glow::INVALID_OPERATION);
            return;
        }
        if self.framebuffer_status(self.state.draw_framebuffer) != glow::FRAMEBUFFER_COMPLETE {
            self.record(glow::INVALID_FRAMEBUFFER_OPERATION);
            return;
        }
        let indices = match vertices {
            Vertices::Range { first, count } => {
                if first < 0 {
                    self.record(glow::INVALID_VALUE);
                    return;
                }
                (first as u32..first as u32 + count as u32).collect::<Vec<_>>()
            }
            Vertices::Elements { count, ty, offset } => {
                match self.element_indices(count, ty, offset) {
                    Ok(indices) => indices,
                    Err(err) => {
                        self.record(err);
                        return;
                    }
                }
            }
        };
        self.draw_calls += 1;
        trace!(mode, vertices = indices.len(), instances, "soft draw");

        if mode != glow::POINTS || self.state.enabled.contains(&glow::RASTERIZER_DISCARD) {
            return;
        }
        let fragments = self.shade_points(&indices, instances as u32);
        let mask = self.state.color_mask;
        for surface in self.draw_surfaces() {
            if let Some(image) = self.surface_image_mut(surface) {
                for &(x, y, color) in &fragments {
                    image.put(x, y, color, mask);
                }
            }
        }
    }

    pub(super) fn blit_color(&mut self, src: Rect, dst: Rect) -> Result<(), u32> {
        let source = self.read_surface()?;
        let image = self
            .surface_image(source)
            .cloned()
            .ok_or(glow::INVALID_OPERATION)?;
        for surface in self.draw_surfaces() {
            if let Some(target) = self.surface_image_mut(surface) {
                raster::blit_nearest(&image, src, target, dst);
            }
        }
        Ok(())
    }

    /// Copies the read surface into `out` as tightly packed bottom-up RGBA8 rows.
    pub(super) fn read_rgba8(&self, rect: Rect, out: &mut [u8], pack: Pack) -> Result<(), u32> {
        let image = self
            .surface_image(self.read_surface()?)
            .ok_or(glow::INVALID_OPERATION)?;
        let (offset, stride) = pack.layout((rect.x1 - rect.x0) as usize);
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                if let Some(texel) = image.get(x, y) {
                    let at = offset + (y - rect.y0) as usize * stride + (x - rect.x0) as usize * 4;
                    out[at..at + 4].copy_from_slice(&texel);
                }
            }
        }
        Ok(())
    }
}
