//! The texture painter entry point: thin orchestration over the
//! configuration merger, the surface capability, and the mixin library.

use crate::config::{Defaults, EffectiveConfig, Options};
use crate::mixins::Brush;
use crate::rand::Rng;
use crate::surface::{RaqoteSurface, SurfaceProvider, TargetElement};

/// Paints one texture and applies it to `target` as a background image.
///
/// Builds the effective configuration, acquires a surface from `surfaces`,
/// runs the paint callback once (synchronously) with the mixin-augmented
/// context, serializes the raster, and prepends the resulting image URL to
/// the target's background (falling back to the literal `none repeat`).
/// Binds the configured open-image event afterward, if any.
///
/// Returns `Ok(None)` without touching the target when the surface
/// capability is unavailable. A panicking paint callback propagates to the
/// caller.
pub fn paint(
    defaults: &Defaults,
    surfaces: &dyn SurfaceProvider,
    target: &mut dyn TargetElement,
    options: &Options,
) -> anyhow::Result<Option<String>> {
    let config = defaults.extend(options);

    let Some(mut surface) = surfaces.create_surface(config.width, config.height) else {
        return Ok(None);
    };
    {
        let Some(ctx) = surface.context() else {
            return Ok(None);
        };
        let mut rng = Rng::from_seed(&config.seed);
        let mut brush = Brush::new(ctx, &config.mixins, &mut rng);
        (config.paint)(&mut brush);
    }
    let url = surface.to_image_url()?;

    let background = match target.background_image() {
        Some(prior) if !prior.is_empty() => format!("url({}), {}", url, prior),
        _ => format!("url({}), none repeat", url),
    };
    target.set_background_image(&background);

    if let Some(event) = &config.open_image_on {
        target.bind_open_image(event, &url);
    }
    Ok(Some(url))
}

/// Rasterizes one texture directly to a raqote surface, bypassing the
/// target-element plumbing. This is the CLI path.
pub fn render(config: &EffectiveConfig) -> RaqoteSurface {
    let mut surface = RaqoteSurface::new(config.width, config.height);
    let mut rng = Rng::from_seed(&config.seed);
    {
        let mut brush = Brush::new(surface.context_mut(), &config.mixins, &mut rng);
        (config.paint)(&mut brush);
    }
    surface
}
