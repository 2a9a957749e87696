use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use raqote::{DrawOptions, DrawTarget, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::color::Color;

/// Primitive raster operations against a surface. Mixins and paint callbacks
/// draw exclusively through this capability, so textures can be painted onto
/// anything that can hold a path and fill a rectangle.
pub trait DrawingContext {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    /// Strokes the current path without clearing it.
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill_style(&self) -> Color;
    fn set_fill_style(&mut self, color: Color);
    fn stroke_style(&self) -> Color;
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
}

/// A drawable raster of fixed pixel dimensions.
pub trait Surface {
    /// The drawing capability, or `None` when drawing is unsupported (the
    /// painter degrades to a no-op in that case).
    fn context(&mut self) -> Option<&mut dyn DrawingContext>;

    /// Serializes the drawn raster to a portable `data:image/png;base64,...`
    /// URL.
    fn to_image_url(&self) -> anyhow::Result<String>;
}

pub trait SurfaceProvider {
    /// Creates a surface, or `None` when the capability is unavailable.
    fn create_surface(&self, width: i32, height: i32) -> Option<Box<dyn Surface>>;
}

/// The element receiving the generated texture as its background.
pub trait TargetElement {
    fn background_image(&self) -> Option<String>;
    fn set_background_image(&mut self, value: &str);
    /// Binds a named interaction event that opens the full image.
    fn bind_open_image(&mut self, event: &str, image_url: &str);
}

#[derive(Debug, Copy, Clone)]
enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Close,
}

/// Raqote-backed [`DrawingContext`]. Tracks the current path and styles
/// itself since raqote's draw targets are stateless about both.
pub struct RaqoteContext {
    dt: DrawTarget,
    path: Vec<PathCmd>,
    fill_style: Color,
    stroke_style: Color,
    line_width: f64,
}

impl RaqoteContext {
    fn new(width: i32, height: i32) -> Self {
        RaqoteContext {
            dt: DrawTarget::new(width, height),
            path: Vec::new(),
            fill_style: Color::default(),
            stroke_style: Color::default(),
            line_width: 1.0,
        }
    }

    fn current_path(&self) -> raqote::Path {
        let mut pb = PathBuilder::new();
        for cmd in &self.path {
            match *cmd {
                PathCmd::MoveTo(x, y) => pb.move_to(x, y),
                PathCmd::LineTo(x, y) => pb.line_to(x, y),
                PathCmd::Close => pb.close(),
            }
        }
        pb.finish()
    }
}

fn solid_source(color: Color) -> SolidSource {
    SolidSource::from_unpremultiplied_argb(
        (color.alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        color.red,
        color.green,
        color.blue,
    )
}

impl DrawingContext for RaqoteContext {
    fn width(&self) -> i32 {
        self.dt.width()
    }

    fn height(&self) -> i32 {
        self.dt.height()
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(PathCmd::MoveTo(x as f32, y as f32));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.push(PathCmd::LineTo(x as f32, y as f32));
    }

    fn close_path(&mut self) {
        self.path.push(PathCmd::Close);
    }

    fn stroke(&mut self) {
        let path = self.current_path();
        let style = StrokeStyle {
            width: self.line_width as f32,
            ..StrokeStyle::default()
        };
        self.dt.stroke(
            &path,
            &Source::Solid(solid_source(self.stroke_style)),
            &style,
            &DrawOptions::new(),
        );
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.dt.fill_rect(
            x as f32,
            y as f32,
            width as f32,
            height as f32,
            &Source::Solid(solid_source(self.fill_style)),
            &DrawOptions::new(),
        );
    }

    fn fill_style(&self) -> Color {
        self.fill_style
    }

    fn set_fill_style(&mut self, color: Color) {
        self.fill_style = color;
    }

    fn stroke_style(&self) -> Color {
        self.stroke_style
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.stroke_style = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }
}

/// A raqote-backed [`Surface`].
pub struct RaqoteSurface {
    ctx: RaqoteContext,
}

impl RaqoteSurface {
    pub fn new(width: i32, height: i32) -> Self {
        RaqoteSurface {
            ctx: RaqoteContext::new(width, height),
        }
    }

    pub fn context_mut(&mut self) -> &mut RaqoteContext {
        &mut self.ctx
    }

    pub fn draw_target(&self) -> &DrawTarget {
        &self.ctx.dt
    }

    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        self.ctx.dt.write_png(path)?;
        Ok(())
    }

    /// Raqote stores premultiplied BGRA; PNG wants straight RGBA.
    fn rgba_pixels(&self) -> Vec<u8> {
        let data = self.ctx.dt.get_data();
        let mut rgba = Vec::with_capacity(data.len() * 4);
        for px in data {
            let [b, g, r, a] = px.to_le_bytes();
            let (r, g, b) = if a == 0 || a == 255 {
                (r, g, b)
            } else {
                let a = u16::from(a);
                (
                    ((u16::from(r) * 255) / a).min(255) as u8,
                    ((u16::from(g) * 255) / a).min(255) as u8,
                    ((u16::from(b) * 255) / a).min(255) as u8,
                )
            };
            rgba.extend_from_slice(&[r, g, b, a]);
        }
        rgba
    }
}

impl Surface for RaqoteSurface {
    fn context(&mut self) -> Option<&mut dyn DrawingContext> {
        Some(&mut self.ctx)
    }

    fn to_image_url(&self) -> anyhow::Result<String> {
        let rgba = self.rgba_pixels();
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            &rgba,
            self.ctx.dt.width() as u32,
            self.ctx.dt.height() as u32,
            ColorType::Rgba8,
        )?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
    }
}

/// Provider for raqote surfaces; always available, except for degenerate
/// dimensions.
pub struct RaqoteSurfaceProvider;

impl SurfaceProvider for RaqoteSurfaceProvider {
    fn create_surface(&self, width: i32, height: i32) -> Option<Box<dyn Surface>> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Box::new(RaqoteSurface::new(width, height)))
    }
}
