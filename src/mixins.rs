//! The drawing mixin library: a registry of named drawing operations that
//! run against a [`DrawingContext`] capability through a [`Brush`].
//!
//! Built-in operations compose through the registry rather than calling each
//! other directly, so replacing one (say, `line_path`) changes the behavior
//! of everything layered on it (`line`, and through it the dashed variants),
//! the same way dynamically extended contexts behave.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::color::Color;
use crate::math::{map_to_range, map_to_range_floor};
use crate::rand::{Bias, Distribution, Rng};
use crate::surface::DrawingContext;

/// An argument to a registry-dispatched mixin. Missing or mistyped numeric
/// arguments read as `0.0`; this is a fail-silent visual utility.
#[derive(Clone)]
pub enum Arg {
    Num(f64),
    Text(String),
    Noise(NoiseSpec),
    Repeat(RepeatSpec),
    Cell(CellFn),
}

/// Callback invoked by `repeat` for each grid placement:
/// `(brush, x, y, col_index, row_index)`.
pub type CellFn = Arc<dyn Fn(&mut Brush<'_>, f64, f64, u32, u32) + Send + Sync>;

pub type MixinFn = Arc<dyn Fn(&mut Brush<'_>, &[Arg]) + Send + Sync>;

/// Custom random source for noise: `(rng, sample_count, bias, x, y)`, where
/// `(x, y)` is the grain origin, returning a value in `[0, 1]`.
pub type Sampler = Arc<dyn Fn(&mut Rng, u32, &Bias, f64, f64) -> f64 + Send + Sync>;

/// A grid of placements from `from` to `to` (both inclusive), stepping by
/// `increment`. Zero increment components are replaced by `(to - from) * 2`
/// (effectively a single placement), or by `1` when that is also zero, so a
/// zero-step specification cannot loop forever.
#[derive(Debug, Copy, Clone)]
pub struct RepeatSpec {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub increment: (f64, f64),
}

impl Default for RepeatSpec {
    fn default() -> Self {
        RepeatSpec {
            from: (0.0, 0.0),
            to: (1.0, 1.0),
            increment: (10.0, 10.0),
        }
    }
}

/// Pixel dimensions of a single noise grain.
#[derive(Debug, Copy, Clone)]
pub struct GrainDimension {
    pub width: f64,
    pub height: f64,
}

impl From<f64> for GrainDimension {
    fn from(side: f64) -> Self {
        GrainDimension {
            width: side,
            height: side,
        }
    }
}

/// Alpha endpoints for noise grains: either a span mapped through the same
/// random sample as the color channels, or a single scalar applied to both
/// endpoints.
#[derive(Debug, Copy, Clone)]
pub enum Opacity {
    Flat(f64),
    Range { from: f64, to: f64 },
}

impl Opacity {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Opacity::Flat(v) => (v, v),
            Opacity::Range { from, to } => (from, to),
        }
    }
}

/// Parameters for the `noise` mixin.
#[derive(Clone)]
pub struct NoiseSpec {
    pub opacity: Opacity,
    pub grain_dimension: GrainDimension,
    pub from_color: String,
    pub to_color: String,
    /// When set, each of R, G, B gets its own random sample and alpha gets a
    /// plain uniform deviate; otherwise one sample drives all four channels.
    pub independent_channels: bool,
    pub distribution: Distribution,
    pub bias: Bias,
    /// Replaces the parametric sampler when set.
    pub sampler: Option<Sampler>,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        NoiseSpec {
            opacity: Opacity::Range { from: 0.1, to: 0.5 },
            grain_dimension: GrainDimension::from(1.0),
            from_color: "000000".to_owned(),
            to_color: "606060".to_owned(),
            independent_channels: false,
            distribution: Distribution::Bell,
            bias: Bias::default(),
            sampler: None,
        }
    }
}

/// Registry of named drawing operations. Merging is last-writer-wins per
/// name, so callers can add or replace individual operations without losing
/// the rest.
#[derive(Clone, Default)]
pub struct Mixins(BTreeMap<String, MixinFn>);

impl Mixins {
    /// The library's built-in drawing operations.
    pub fn builtin() -> Mixins {
        let mut mixins = Mixins::default();
        mixins.register("line_path", builtin::line_path);
        mixins.register("line", builtin::line);
        mixins.register("dashed_path", builtin::dashed_path);
        mixins.register("dashed_line", builtin::dashed_line);
        mixins.register("repeat", builtin::repeat);
        mixins.register("polygon", builtin::polygon);
        mixins.register("fill_background", builtin::fill_background);
        mixins.register("noise", builtin::noise);
        mixins
    }

    pub fn register<F>(&mut self, name: impl Into<String>, op: F)
    where
        F: Fn(&mut Brush<'_>, &[Arg]) + Send + Sync + 'static,
    {
        self.0.insert(name.into(), Arc::new(op));
    }

    /// A new registry with `overrides` layered over `self`.
    pub fn merged_with(&self, overrides: &Mixins) -> Mixins {
        let mut merged = self.clone();
        for (name, op) in &overrides.0 {
            merged.0.insert(name.clone(), op.clone());
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<MixinFn> {
        self.0.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A drawing context augmented with the mixin registry and the paint pass's
/// random state. This is what paint callbacks receive.
pub struct Brush<'a> {
    pub ctx: &'a mut dyn DrawingContext,
    pub mixins: &'a Mixins,
    pub rng: &'a mut Rng,
}

impl<'a> Brush<'a> {
    pub fn new(ctx: &'a mut dyn DrawingContext, mixins: &'a Mixins, rng: &'a mut Rng) -> Brush<'a> {
        Brush { ctx, mixins, rng }
    }

    /// Invokes a registered mixin by name. Unknown names are silently
    /// ignored.
    pub fn apply(&mut self, name: &str, args: &[Arg]) {
        if let Some(op) = self.mixins.get(name) {
            op(self, args);
        }
    }

    /// Appends a straight segment to the current path without stroking.
    pub fn line_path(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.apply(
            "line_path",
            &[Arg::Num(x1), Arg::Num(y1), Arg::Num(x2), Arg::Num(y2)],
        );
    }

    /// Strokes a straight line between two points on a fresh path.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.apply(
            "line",
            &[Arg::Num(x1), Arg::Num(y1), Arg::Num(x2), Arg::Num(y2)],
        );
    }

    /// Draws alternating dash/gap runs along the segment. Zero dash or gap
    /// lengths fall back to 3 pixels.
    pub fn dashed_path(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, dash: f64, gap: f64) {
        self.apply(
            "dashed_path",
            &[
                Arg::Num(x1),
                Arg::Num(y1),
                Arg::Num(x2),
                Arg::Num(y2),
                Arg::Num(dash),
                Arg::Num(gap),
            ],
        );
    }

    /// [`Brush::dashed_path`] wrapped in an explicit begin/stroke pair, for
    /// symmetry with `line`/`line_path`.
    pub fn dashed_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, dash: f64, gap: f64) {
        self.apply(
            "dashed_line",
            &[
                Arg::Num(x1),
                Arg::Num(y1),
                Arg::Num(x2),
                Arg::Num(y2),
                Arg::Num(dash),
                Arg::Num(gap),
            ],
        );
    }

    /// Builds a closed polygon path through `points` in order. Does not
    /// stroke or fill; callers chain explicitly.
    pub fn polygon(&mut self, points: &[(f64, f64)]) {
        let args: Vec<Arg> = points
            .iter()
            .flat_map(|&(x, y)| [Arg::Num(x), Arg::Num(y)])
            .collect();
        self.apply("polygon", &args);
    }

    /// Fills the entire surface with `color` (or the current fill style).
    pub fn fill_background(&mut self, color: Option<&str>) {
        match color {
            Some(color) => self.apply("fill_background", &[Arg::Text(color.to_owned())]),
            None => self.apply("fill_background", &[]),
        }
    }

    /// Tiles the surface with random grains per `spec`.
    pub fn noise(&mut self, spec: NoiseSpec) {
        self.apply("noise", &[Arg::Noise(spec)]);
    }

    /// Iterates the grid described by `spec`, invoking `cell` for each
    /// placement with zero-based column and row step counts.
    ///
    /// This typed form takes any closure; the registry's `repeat` entry is
    /// the [`Arg`]-dispatched equivalent for [`CellFn`] callbacks.
    pub fn repeat<F>(&mut self, spec: RepeatSpec, mut cell: F)
    where
        F: FnMut(&mut Brush<'_>, f64, f64, u32, u32),
    {
        repeat_impl(self, spec, &mut cell);
    }
}

fn num(args: &[Arg], index: usize) -> f64 {
    match args.get(index) {
        Some(Arg::Num(v)) => *v,
        _ => 0.0,
    }
}

fn num_or(args: &[Arg], index: usize, fallback: f64) -> f64 {
    let v = num(args, index);
    if v == 0.0 {
        fallback
    } else {
        v
    }
}

fn repeat_impl(
    brush: &mut Brush<'_>,
    spec: RepeatSpec,
    cell: &mut dyn FnMut(&mut Brush<'_>, f64, f64, u32, u32),
) {
    let fix = |increment: f64, from: f64, to: f64| -> f64 {
        // A non-positive step would never terminate (or never run); replace
        // it with a stride that visits the start cell exactly once.
        if increment <= 0.0 {
            let single = (to - from) * 2.0;
            if single == 0.0 {
                1.0
            } else {
                single
            }
        } else {
            increment
        }
    };
    let step_x = fix(spec.increment.0, spec.from.0, spec.to.0);
    let step_y = fix(spec.increment.1, spec.from.1, spec.to.1);

    let mut col = 0u32;
    let mut x = spec.from.0;
    while x <= spec.to.0 {
        let mut row = 0u32;
        let mut y = spec.from.1;
        while y <= spec.to.1 {
            cell(brush, x, y, col, row);
            row += 1;
            y += step_y;
        }
        col += 1;
        x += step_x;
    }
}

mod builtin {
    use super::*;

    pub(super) fn line_path(brush: &mut Brush<'_>, args: &[Arg]) {
        brush.ctx.move_to(num(args, 0), num(args, 1));
        brush.ctx.line_to(num(args, 2), num(args, 3));
    }

    pub(super) fn line(brush: &mut Brush<'_>, args: &[Arg]) {
        brush.ctx.begin_path();
        brush.apply("line_path", args);
        brush.ctx.stroke();
    }

    pub(super) fn dashed_path(brush: &mut Brush<'_>, args: &[Arg]) {
        let (x1, y1) = (num(args, 0), num(args, 1));
        let (x2, y2) = (num(args, 2), num(args, 3));
        let dash = num_or(args, 4, 3.0);
        let gap = num_or(args, 5, 3.0);

        let line_length = f64::hypot(x2 - x1, y2 - y1);
        // Degenerate segments have no direction to dash along; negative
        // dash/gap pairs would never accumulate past the segment length.
        if line_length == 0.0 || dash + gap <= 0.0 {
            return;
        }
        let dash_x = dash * (x2 - x1) / line_length;
        let dash_y = dash * (y2 - y1) / line_length;
        let gap_x = gap * (x2 - x1) / line_length;
        let gap_y = gap * (y2 - y1) / line_length;

        let (mut x, mut y) = (x1, y1);
        let mut len = 0.0;
        while len <= line_length {
            brush.apply(
                "line",
                &[
                    Arg::Num(x),
                    Arg::Num(y),
                    Arg::Num(x + dash_x),
                    Arg::Num(y + dash_y),
                ],
            );
            x += dash_x + gap_x;
            y += dash_y + gap_y;
            len += dash + gap;
        }
    }

    pub(super) fn dashed_line(brush: &mut Brush<'_>, args: &[Arg]) {
        brush.ctx.begin_path();
        brush.apply("dashed_path", args);
        brush.ctx.stroke();
    }

    pub(super) fn repeat(brush: &mut Brush<'_>, args: &[Arg]) {
        let spec = match args.first() {
            Some(Arg::Repeat(spec)) => *spec,
            _ => RepeatSpec::default(),
        };
        let cell = match args.get(1) {
            Some(Arg::Cell(cell)) => cell.clone(),
            _ => return,
        };
        repeat_impl(brush, spec, &mut |brush, x, y, col, row| {
            cell(brush, x, y, col, row)
        });
    }

    pub(super) fn polygon(brush: &mut Brush<'_>, args: &[Arg]) {
        brush.ctx.begin_path();
        for (i, pair) in args.chunks(2).enumerate() {
            if pair.len() < 2 {
                break; // dangling coordinate
            }
            let (x, y) = (num(pair, 0), num(pair, 1));
            if i == 0 {
                brush.ctx.move_to(x, y);
            } else {
                brush.ctx.line_to(x, y);
            }
        }
        brush.ctx.close_path();
    }

    pub(super) fn fill_background(brush: &mut Brush<'_>, args: &[Arg]) {
        let original_fill = brush.ctx.fill_style();
        if let Some(Arg::Text(hex)) = args.first() {
            brush.ctx.set_fill_style(Color::parse(hex));
        }
        let (width, height) = (brush.ctx.width() as f64, brush.ctx.height() as f64);
        brush.ctx.fill_rect(0.0, 0.0, width, height);
        // Restores the saved fill style into the *stroke* slot. This mirrors
        // the long-standing observable behavior of the operation; see
        // DESIGN.md.
        brush.ctx.set_stroke_style(original_fill);
    }

    pub(super) fn noise(brush: &mut Brush<'_>, args: &[Arg]) {
        let default_spec;
        let spec = match args.first() {
            Some(Arg::Noise(spec)) => spec,
            _ => {
                default_spec = NoiseSpec::default();
                &default_spec
            }
        };
        let n = spec.distribution.samples();
        let (alpha_from, alpha_to) = spec.opacity.bounds();
        let from = Color::parse(&spec.from_color).with_alpha(alpha_from);
        let to = Color::parse(&spec.to_color).with_alpha(alpha_to);

        let grain = spec.grain_dimension;
        if grain.width <= 0.0 || grain.height <= 0.0 {
            return;
        }
        let (width, height) = (brush.ctx.width() as f64, brush.ctx.height() as f64);

        // Grain origins advance column-major: outer loop over x, inner over y.
        let mut x = 0.0;
        while x < width {
            let mut y = 0.0;
            while y < height {
                let (red, green, blue, alpha);
                if !spec.independent_channels {
                    let t = draw_sample(brush, spec, n, x, y);
                    red = map_to_range_floor(t, f64::from(from.red), f64::from(to.red));
                    green = map_to_range_floor(t, f64::from(from.green), f64::from(to.green));
                    blue = map_to_range_floor(t, f64::from(from.blue), f64::from(to.blue));
                    alpha = map_to_range(t, from.alpha, to.alpha);
                } else {
                    let t = draw_sample(brush, spec, n, x, y);
                    red = map_to_range_floor(t, f64::from(from.red), f64::from(to.red));
                    let t = draw_sample(brush, spec, n, x, y);
                    green = map_to_range_floor(t, f64::from(from.green), f64::from(to.green));
                    let t = draw_sample(brush, spec, n, x, y);
                    blue = map_to_range_floor(t, f64::from(from.blue), f64::from(to.blue));
                    alpha = map_to_range(brush.rng.rnd(), from.alpha, to.alpha);
                }
                brush
                    .ctx
                    .set_fill_style(Color::from_channels(red, green, blue, alpha));
                brush.ctx.fill_rect(x, y, grain.width, grain.height);
                y += grain.height;
            }
            x += grain.width;
        }
    }

    fn draw_sample(brush: &mut Brush<'_>, spec: &NoiseSpec, n: u32, x: f64, y: f64) -> f64 {
        match &spec.sampler {
            Some(sampler) => sampler(brush.rng, n, &spec.bias, x, y),
            None => brush.rng.parametric(n, &spec.bias),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Op {
        BeginPath,
        MoveTo(f64, f64),
        LineTo(f64, f64),
        ClosePath,
        Stroke,
        FillRect(f64, f64, f64, f64),
    }

    struct RecordingContext {
        width: i32,
        height: i32,
        fill_style: Color,
        stroke_style: Color,
        ops: Vec<Op>,
    }

    impl RecordingContext {
        fn new(width: i32, height: i32) -> Self {
            RecordingContext {
                width,
                height,
                fill_style: Color::default(),
                stroke_style: Color::default(),
                ops: Vec::new(),
            }
        }
    }

    impl DrawingContext for RecordingContext {
        fn width(&self) -> i32 {
            self.width
        }
        fn height(&self) -> i32 {
            self.height
        }
        fn begin_path(&mut self) {
            self.ops.push(Op::BeginPath);
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::MoveTo(x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.ops.push(Op::LineTo(x, y));
        }
        fn close_path(&mut self) {
            self.ops.push(Op::ClosePath);
        }
        fn stroke(&mut self) {
            self.ops.push(Op::Stroke);
        }
        fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
            self.ops.push(Op::FillRect(x, y, width, height));
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
        fn set_line_width(&mut self, _width: f64) {}
    }

    fn with_brush<R>(
        width: i32,
        height: i32,
        mixins: &Mixins,
        f: impl FnOnce(&mut Brush<'_>) -> R,
    ) -> (RecordingContext, R) {
        let mut ctx = RecordingContext::new(width, height);
        let mut rng = Rng::from_seed(b"");
        let result = {
            let mut brush = Brush::new(&mut ctx, mixins, &mut rng);
            f(&mut brush)
        };
        (ctx, result)
    }

    #[test]
    fn test_line_begins_path_and_strokes() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| b.line(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            ctx.ops,
            vec![
                Op::BeginPath,
                Op::MoveTo(1.0, 2.0),
                Op::LineTo(3.0, 4.0),
                Op::Stroke,
            ]
        );
    }

    #[test]
    fn test_line_path_does_not_stroke() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| b.line_path(0.0, 0.0, 5.0, 5.0));
        assert_eq!(ctx.ops, vec![Op::MoveTo(0.0, 0.0), Op::LineTo(5.0, 5.0)]);
    }

    #[test]
    fn test_line_composes_through_registry() {
        let mut mixins = Mixins::builtin();
        // Replacing `line_path` reroutes `line` as well.
        mixins.register("line_path", |brush: &mut Brush<'_>, _args: &[Arg]| {
            brush.ctx.move_to(-1.0, -1.0);
        });
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| b.line(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            ctx.ops,
            vec![Op::BeginPath, Op::MoveTo(-1.0, -1.0), Op::Stroke]
        );
    }

    #[test]
    fn test_unknown_mixin_is_silent() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| b.apply("sparkles", &[]));
        assert!(ctx.ops.is_empty());
    }

    #[test]
    fn test_dashed_path_segments() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(20, 20, &mixins, |b| {
            b.dashed_path(0.0, 0.0, 10.0, 0.0, 3.0, 2.0)
        });
        // Dashes start at 0, 5, and 10 along the segment; each dash is an
        // independent stroked line.
        let dashes: Vec<(f64, f64)> = ctx
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::MoveTo(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(dashes, vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let strokes = ctx.ops.iter().filter(|op| **op == Op::Stroke).count();
        assert_eq!(strokes, 3);
    }

    #[test]
    fn test_dashed_path_total_length_bounded() {
        let mixins = Mixins::builtin();
        for (x2, y2, dash, gap) in [
            (10.0, 0.0, 3.0, 2.0),
            (7.0, 9.0, 1.0, 1.0),
            (100.0, 1.0, 9.0, 4.0),
        ] {
            let (ctx, ()) = with_brush(200, 200, &mixins, |b| {
                b.dashed_path(0.0, 0.0, x2, y2, dash, gap)
            });
            let dashes = ctx
                .ops
                .iter()
                .filter(|op| matches!(op, Op::Stroke))
                .count() as f64;
            let segment = f64::hypot(x2, y2);
            assert!(
                dashes * dash <= segment + dash,
                "{} dashes of {} on a segment of {}",
                dashes,
                dash,
                segment
            );
        }
    }

    #[test]
    fn test_dashed_path_zero_dash_defaults() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(20, 20, &mixins, |b| {
            b.dashed_path(0.0, 0.0, 9.0, 0.0, 0.0, 0.0)
        });
        // 0 falls back to 3/3: dashes at 0 and 6.
        let dashes: Vec<(f64, f64)> = ctx
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::MoveTo(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(dashes, vec![(0.0, 0.0), (6.0, 0.0)]);
    }

    #[test]
    fn test_dashed_path_degenerate_segment_is_noop() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(20, 20, &mixins, |b| {
            b.dashed_path(4.0, 4.0, 4.0, 4.0, 3.0, 3.0)
        });
        assert!(ctx.ops.is_empty());
    }

    #[test]
    fn test_dashed_line_wraps_in_path() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(20, 20, &mixins, |b| {
            b.dashed_line(0.0, 0.0, 4.0, 0.0, 3.0, 3.0)
        });
        assert_eq!(ctx.ops.first(), Some(&Op::BeginPath));
        assert_eq!(ctx.ops.last(), Some(&Op::Stroke));
    }

    #[test]
    fn test_repeat_visits_inclusive_grid() {
        let mixins = Mixins::builtin();
        let spec = RepeatSpec {
            from: (0.0, 0.0),
            to: (20.0, 10.0),
            increment: (10.0, 5.0),
        };
        let (_ctx, visits) = with_brush(1, 1, &mixins, |b| {
            let mut visits = Vec::new();
            b.repeat(spec, |_b, x, y, col, row| visits.push((x, y, col, row)));
            visits
        });
        assert_eq!(visits.len(), 9);
        assert_eq!(visits[0], (0.0, 0.0, 0, 0));
        assert_eq!(visits[8], (20.0, 10.0, 2, 2));
    }

    #[test]
    fn test_repeat_zero_increment_visits_once() {
        let mixins = Mixins::builtin();
        let spec = RepeatSpec {
            from: (0.0, 0.0),
            to: (10.0, 10.0),
            increment: (0.0, 0.0),
        };
        let (_ctx, visits) = with_brush(1, 1, &mixins, |b| {
            let mut visits = Vec::new();
            b.repeat(spec, |_b, x, y, _col, _row| visits.push((x, y)));
            visits
        });
        assert_eq!(visits, vec![(0.0, 0.0)]);
    }

    #[test]
    fn test_repeat_registry_dispatch() {
        let mixins = Mixins::builtin();
        let spec = RepeatSpec {
            from: (0.0, 0.0),
            to: (1.0, 1.0),
            increment: (1.0, 1.0),
        };
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| {
            let cell: CellFn = Arc::new(|b, x, y, _col, _row| b.line_path(x, y, x + 1.0, y));
            b.apply("repeat", &[Arg::Repeat(spec), Arg::Cell(cell)]);
        });
        let moves = ctx
            .ops
            .iter()
            .filter(|op| matches!(op, Op::MoveTo(..)))
            .count();
        assert_eq!(moves, 4);
    }

    #[test]
    fn test_polygon_path() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(10, 10, &mixins, |b| {
            b.polygon(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0)])
        });
        assert_eq!(
            ctx.ops,
            vec![
                Op::BeginPath,
                Op::MoveTo(0.0, 0.0),
                Op::LineTo(4.0, 0.0),
                Op::LineTo(2.0, 3.0),
                Op::ClosePath,
            ]
        );
    }

    #[test]
    fn test_fill_background_covers_surface_and_swaps_style() {
        let mixins = Mixins::builtin();
        let original = Color::parse("123456");
        let (ctx, ()) = with_brush(8, 6, &mixins, |b| {
            b.ctx.set_fill_style(original);
            b.fill_background(Some("ff0000"));
        });
        assert_eq!(ctx.ops, vec![Op::FillRect(0.0, 0.0, 8.0, 6.0)]);
        assert_eq!(ctx.fill_style, Color::parse("ff0000"));
        // The saved fill style lands in the stroke slot.
        assert_eq!(ctx.stroke_style, original);
    }

    #[test]
    fn test_fill_background_without_color_uses_fill_style() {
        let mixins = Mixins::builtin();
        let original = Color::parse("abcdef");
        let (ctx, ()) = with_brush(8, 6, &mixins, |b| {
            b.ctx.set_fill_style(original);
            b.fill_background(None);
        });
        assert_eq!(ctx.ops, vec![Op::FillRect(0.0, 0.0, 8.0, 6.0)]);
        assert_eq!(ctx.fill_style, original);
        assert_eq!(ctx.stroke_style, original);
    }

    #[test]
    fn test_noise_fills_every_grain_in_bounds() {
        let mixins = Mixins::builtin();
        let (ctx, ()) = with_brush(5, 4, &mixins, |b| b.noise(NoiseSpec::default()));
        let grains: Vec<(f64, f64)> = ctx
            .ops
            .iter()
            .map(|op| match op {
                Op::FillRect(x, y, w, h) => {
                    assert_eq!((*w, *h), (1.0, 1.0));
                    (*x, *y)
                }
                other => panic!("unexpected op: {:?}", other),
            })
            .collect();
        assert_eq!(grains.len(), 5 * 4);
        for &(x, y) in &grains {
            assert!((0.0..5.0).contains(&x) && (0.0..4.0).contains(&y));
        }
        // Column-major: the first column is exhausted before x advances.
        assert_eq!(&grains[..5], &[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (0.0, 3.0), (1.0, 0.0)]);
    }

    #[test]
    fn test_noise_grain_dimension_tiles() {
        let mixins = Mixins::builtin();
        let spec = NoiseSpec {
            grain_dimension: GrainDimension {
                width: 2.0,
                height: 3.0,
            },
            ..NoiseSpec::default()
        };
        let (ctx, ()) = with_brush(4, 6, &mixins, |b| b.noise(spec));
        assert_eq!(ctx.ops.len(), 2 * 2);
    }

    #[test]
    fn test_noise_shared_sample_keeps_channels_correlated() {
        let mixins = Mixins::builtin();
        let spec = NoiseSpec {
            opacity: Opacity::Flat(1.0),
            from_color: "000000".to_owned(),
            to_color: "ffffff".to_owned(),
            ..NoiseSpec::default()
        };
        let mut ctx = RecordingContext::new(1, 1);
        let mut rng = Rng::from_seed(b"");
        {
            let mut brush = Brush::new(&mut ctx, &mixins, &mut rng);
            brush.noise(spec);
        }
        // One grain, one shared sample: all channels are equal.
        let c = ctx.fill_style;
        assert_eq!(c.red, c.green);
        assert_eq!(c.green, c.blue);
        assert_eq!(c.alpha, 1.0);
    }

    #[test]
    fn test_noise_flat_opacity_applies_to_both_endpoints() {
        let mixins = Mixins::builtin();
        let spec = NoiseSpec {
            opacity: Opacity::Flat(0.25),
            ..NoiseSpec::default()
        };
        let (ctx, ()) = with_brush(1, 1, &mixins, |b| b.noise(spec));
        assert_eq!(ctx.fill_style.alpha, 0.25);
    }

    #[test]
    fn test_noise_custom_sampler_replaces_random_source() {
        let mixins = Mixins::builtin();
        let spec = NoiseSpec {
            opacity: Opacity::Flat(1.0),
            from_color: "000000".to_owned(),
            to_color: "ffffff".to_owned(),
            sampler: Some(Arc::new(|_rng, _n, _bias, _x, _y| 1.0)),
            ..NoiseSpec::default()
        };
        let (ctx, ()) = with_brush(2, 2, &mixins, |b| b.noise(spec));
        assert_eq!(ctx.fill_style, Color::parse("ffffff"));
    }

    #[test]
    fn test_noise_degenerate_grain_is_noop() {
        let mixins = Mixins::builtin();
        let spec = NoiseSpec {
            grain_dimension: GrainDimension::from(0.0),
            ..NoiseSpec::default()
        };
        let (ctx, ()) = with_brush(4, 4, &mixins, |b| b.noise(spec));
        assert!(ctx.ops.is_empty());
    }

    #[test]
    fn test_merged_with_keeps_existing_entries() {
        let base = Mixins::builtin();
        let mut overrides = Mixins::default();
        overrides.register("sparkles", |_b: &mut Brush<'_>, _a: &[Arg]| {});
        let merged = base.merged_with(&overrides);
        for name in [
            "line_path",
            "line",
            "dashed_path",
            "dashed_line",
            "repeat",
            "polygon",
            "fill_background",
            "noise",
            "sparkles",
        ] {
            assert!(merged.contains(name), "missing {}", name);
        }
    }
}
