use std::sync::Arc;

use serde::Deserialize;

use crate::mixins::{Arg, Brush, Mixins};

/// The per-pass paint callback, invoked once with the augmented context.
pub type PaintFn = Arc<dyn Fn(&mut Brush<'_>) + Send + Sync>;

/// Call-site overrides. Every field is optional; unset fields fall through
/// to the defaults layer. The scalar fields deserialize from the JSON
/// options format; the paint callback and mixin registry are code-only.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Hex-encoded seed for the paint pass's random state (`0x` prefix
    /// tolerated). Malformed seeds degrade silently to the empty seed.
    pub seed: Option<String>,
    /// Event name that opens the full image. The empty string disables the
    /// binding.
    pub open_image_on: Option<String>,
    #[serde(skip)]
    pub paint: Option<PaintFn>,
    #[serde(skip)]
    pub mixins: Mixins,
}

/// The process-wide defaults layer. Library defaults at construction;
/// mutable only through the explicit [`Defaults::set`] and
/// [`Defaults::register_mixin`] entry points, and expected not to be mutated
/// concurrently with a paint pass.
#[derive(Clone)]
pub struct Defaults {
    pub width: i32,
    pub height: i32,
    pub seed: Vec<u8>,
    pub open_image_on: Option<String>,
    pub paint: PaintFn,
    pub mixins: Mixins,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            width: 50,
            height: 50,
            seed: Vec::new(),
            open_image_on: Some("dblclick".to_owned()),
            paint: Arc::new(|_| {}),
            mixins: Mixins::builtin(),
        }
    }
}

/// Configuration for one paint pass, built fresh per invocation by layering
/// call-site options over the defaults.
#[derive(Clone)]
pub struct EffectiveConfig {
    pub width: i32,
    pub height: i32,
    pub seed: Vec<u8>,
    pub open_image_on: Option<String>,
    pub paint: PaintFn,
    pub mixins: Mixins,
}

impl Defaults {
    /// Layers `options` over this defaults layer without mutating it. The
    /// mixin registry merges as its own sub-layer, so call-site mixins add to
    /// or replace individual operations without losing the rest.
    pub fn extend(&self, options: &Options) -> EffectiveConfig {
        EffectiveConfig {
            width: options.width.unwrap_or(self.width),
            height: options.height.unwrap_or(self.height),
            seed: match &options.seed {
                Some(seed) => decode_seed(seed),
                None => self.seed.clone(),
            },
            open_image_on: match &options.open_image_on {
                Some(event) if event.is_empty() => None,
                Some(event) => Some(event.clone()),
                None => self.open_image_on.clone(),
            },
            paint: options
                .paint
                .clone()
                .unwrap_or_else(|| self.paint.clone()),
            mixins: self.mixins.merged_with(&options.mixins),
        }
    }

    /// Mutates this defaults layer in place by the same layering rules as
    /// [`Defaults::extend`].
    pub fn set(&mut self, options: &Options) {
        if let Some(width) = options.width {
            self.width = width;
        }
        if let Some(height) = options.height {
            self.height = height;
        }
        if let Some(seed) = &options.seed {
            self.seed = decode_seed(seed);
        }
        match &options.open_image_on {
            Some(event) if event.is_empty() => self.open_image_on = None,
            Some(event) => self.open_image_on = Some(event.clone()),
            None => {}
        }
        if let Some(paint) = &options.paint {
            self.paint = paint.clone();
        }
        self.mixins = self.mixins.merged_with(&options.mixins);
    }

    /// Registers (or replaces) a named drawing operation in the defaults
    /// layer.
    pub fn register_mixin<F>(&mut self, name: impl Into<String>, op: F)
    where
        F: Fn(&mut Brush<'_>, &[Arg]) + Send + Sync + 'static,
    {
        self.mixins.register(name, op);
    }
}

fn decode_seed(seed: &str) -> Vec<u8> {
    let seed = seed.strip_prefix("0x").unwrap_or(seed);
    hex::decode(seed).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_library_defaults() {
        let defaults = Defaults::default();
        assert_eq!((defaults.width, defaults.height), (50, 50));
        assert_eq!(defaults.open_image_on.as_deref(), Some("dblclick"));
        assert!(defaults.mixins.contains("noise"));
    }

    #[test]
    fn test_extend_is_pure() {
        let defaults = Defaults::default();
        let config = defaults.extend(&Options {
            width: Some(128),
            ..Options::default()
        });
        assert_eq!(config.width, 128);
        assert_eq!(config.height, 50);
        assert_eq!(defaults.width, 50);
    }

    #[test]
    fn test_extend_keeps_builtin_mixins() {
        let defaults = Defaults::default();
        let mut options = Options::default();
        options
            .mixins
            .register("foo", |_b: &mut Brush<'_>, _a: &[Arg]| {});
        let config = defaults.extend(&options);
        for name in ["foo", "line", "polygon", "noise", "repeat"] {
            assert!(config.mixins.contains(name), "missing {}", name);
        }
        // And the defaults layer itself is untouched.
        assert!(!defaults.mixins.contains("foo"));
    }

    #[test]
    fn test_set_layers_onto_defaults() {
        let mut defaults = Defaults::default();
        defaults.set(&Options {
            width: Some(100),
            ..Options::default()
        });
        assert_eq!((defaults.width, defaults.height), (100, 50));

        // Call-site options still win over overridden defaults.
        let config = defaults.extend(&Options {
            width: Some(32),
            ..Options::default()
        });
        assert_eq!(config.width, 32);
    }

    #[test]
    fn test_registered_mixins_survive_set() {
        let mut defaults = Defaults::default();
        defaults.register_mixin("foo", |_b: &mut Brush<'_>, _a: &[Arg]| {});
        defaults.set(&Options {
            height: Some(64),
            ..Options::default()
        });
        assert!(defaults.mixins.contains("foo"));
        assert!(defaults.mixins.contains("line"));
    }

    #[test]
    fn test_empty_event_disables_open_image() {
        let defaults = Defaults::default();
        let config = defaults.extend(&Options {
            open_image_on: Some(String::new()),
            ..Options::default()
        });
        assert_eq!(config.open_image_on, None);
    }

    #[test]
    fn test_seed_decoding() {
        let defaults = Defaults::default();
        let seed_of = |s: &str| {
            defaults
                .extend(&Options {
                    seed: Some(s.to_owned()),
                    ..Options::default()
                })
                .seed
        };
        assert_eq!(seed_of("0xdeadbeef"), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(seed_of("1234"), vec![0x12, 0x34]);
        // Malformed seeds degrade to the empty seed.
        assert_eq!(seed_of("xyz"), Vec::<u8>::new());
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let options: Options = serde_json::from_str(
            r#"{"width": 40, "height": 30, "seed": "0xff", "openImageOn": "click"}"#,
        )
        .unwrap();
        assert_eq!(options.width, Some(40));
        assert_eq!(options.height, Some(30));
        assert_eq!(options.seed.as_deref(), Some("0xff"));
        assert_eq!(options.open_image_on.as_deref(), Some("click"));
        assert!(options.paint.is_none());
    }
}
