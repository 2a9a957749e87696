use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use wallpainter::color::Color;
use wallpainter::config::{Defaults, Options, PaintFn};
use wallpainter::mixins::{GrainDimension, NoiseSpec, Opacity, RepeatSpec};
use wallpainter::painter;
use wallpainter::rand::{Bias, Distribution};

#[derive(Parser)]
struct Opts {
    /// Output PNG file.
    out: PathBuf,

    #[clap(long, default_value = "256")]
    width: i32,
    #[clap(long, default_value = "256")]
    height: i32,

    /// Hex-encoded seed for the texture's random state.
    #[clap(long, default_value = "")]
    seed: String,

    #[clap(long, value_enum, default_value = "noise")]
    pattern: Pattern,

    /// JSON file with default overrides, applied via the defaults layer
    /// before the command-line options.
    #[clap(long)]
    options: Option<PathBuf>,

    #[clap(flatten)]
    noise: NoiseOpts,
}

#[derive(clap::Args)]
struct NoiseOpts {
    /// Noise color at the low end of the distribution (6 hex digits).
    #[clap(long, default_value = "000000")]
    from_color: String,
    /// Noise color at the high end of the distribution (6 hex digits).
    #[clap(long, default_value = "606060")]
    to_color: String,
    /// Side length of a square noise grain, in pixels.
    #[clap(long, default_value = "1")]
    grain: f64,
    /// "uniform", "triangular", "bell", or a sample count.
    #[clap(long, default_value = "bell")]
    distribution: Distribution,
    /// Positive values skew grains toward the low end, negative toward the
    /// high end.
    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    bias: f64,
    /// Sample each color channel independently.
    #[clap(long)]
    independent_channels: bool,
    #[clap(long, default_value = "0.1")]
    opacity_from: f64,
    #[clap(long, default_value = "0.5")]
    opacity_to: f64,
}

#[derive(Copy, Clone, ValueEnum)]
enum Pattern {
    /// Parametric noise field.
    Noise,
    /// Graph-paper grid of solid lines.
    Grid,
    /// Diagonal dashed-line mesh.
    Mesh,
    /// Repeated stroked diamond motif.
    Diamonds,
}

fn build_paint(opts: &Opts) -> PaintFn {
    match opts.pattern {
        Pattern::Noise => {
            let spec = NoiseSpec {
                opacity: Opacity::Range {
                    from: opts.noise.opacity_from,
                    to: opts.noise.opacity_to,
                },
                grain_dimension: GrainDimension::from(opts.noise.grain),
                from_color: opts.noise.from_color.clone(),
                to_color: opts.noise.to_color.clone(),
                independent_channels: opts.noise.independent_channels,
                distribution: opts.noise.distribution,
                bias: Bias::Exponent(opts.noise.bias),
                sampler: None,
            };
            Arc::new(move |brush| {
                brush.fill_background(Some("ffffff"));
                brush.noise(spec.clone());
            })
        }
        Pattern::Grid => Arc::new(|brush| {
            brush.fill_background(Some("f4f4f4"));
            brush.ctx.set_stroke_style(Color::parse("c9c9c9"));
            let (w, h) = (brush.ctx.width() as f64, brush.ctx.height() as f64);
            let columns = RepeatSpec {
                from: (0.0, 0.0),
                to: (w, 0.0),
                increment: (16.0, 0.0),
            };
            brush.repeat(columns, move |b, x, _y, _col, _row| b.line(x, 0.0, x, h));
            let rows = RepeatSpec {
                from: (0.0, 0.0),
                to: (0.0, h),
                increment: (0.0, 16.0),
            };
            brush.repeat(rows, move |b, _x, y, _col, _row| b.line(0.0, y, w, y));
        }),
        Pattern::Mesh => Arc::new(|brush| {
            brush.fill_background(Some("202830"));
            brush.ctx.set_stroke_style(Color::parse("5f6b78"));
            let (w, h) = (brush.ctx.width() as f64, brush.ctx.height() as f64);
            let columns = RepeatSpec {
                from: (-h, 0.0),
                to: (w, 0.0),
                increment: (12.0, 0.0),
            };
            brush.repeat(columns, move |b, x, _y, _col, _row| {
                b.dashed_line(x, 0.0, x + h, h, 4.0, 3.0)
            });
        }),
        Pattern::Diamonds => Arc::new(|brush| {
            brush.fill_background(Some("fdfdf6"));
            brush.ctx.set_stroke_style(Color::parse("b0a070"));
            let (w, h) = (brush.ctx.width() as f64, brush.ctx.height() as f64);
            let step = 20.0;
            let grid = RepeatSpec {
                from: (0.0, 0.0),
                to: (w, h),
                increment: (step, step),
            };
            brush.repeat(grid, move |b, x, y, _col, _row| {
                let r = step / 2.0;
                b.polygon(&[(x, y - r), (x + r, y), (x, y + r), (x - r, y)]);
                b.ctx.stroke();
            });
        }),
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let mut defaults = Defaults::default();
    if let Some(path) = &opts.options {
        let file = BufReader::new(File::open(path)?);
        let file_options: Options = serde_json::from_reader(file)?;
        defaults.set(&file_options);
    }

    let options = Options {
        width: Some(opts.width),
        height: Some(opts.height),
        seed: Some(opts.seed.clone()),
        paint: Some(build_paint(&opts)),
        ..Options::default()
    };
    let config = defaults.extend(&options);
    let surface = painter::render(&config);
    surface.write_png(&opts.out)?;
    eprintln!("wrote png: {}", opts.out.display());
    Ok(())
}
