//! Context creation options and engine-wide settings.

use glmux_gl::PhysicalGl;
use serde::Deserialize;

use crate::compositor::CompositorFactory;

/// Attributes requested at context creation. Omitted values take the WebGL defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextOptions {
    pub alpha: Option<bool>,
    pub antialias: Option<bool>,
    pub depth: Option<bool>,
    pub stencil: Option<bool>,
    pub premultiplied_alpha: Option<bool>,
    pub preserve_drawing_buffer: Option<bool>,
    pub fail_if_major_performance_caveat: Option<bool>,
}

impl ContextOptions {
    /// Parses a `getContext` attribute dictionary such as `{"alpha": false}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Attributes a virtual context was actually created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub antialias: bool,
    pub depth: bool,
    pub stencil: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub fail_if_major_performance_caveat: bool,
}

impl ContextAttributes {
    /// Fills in defaults. Antialiasing and the performance-caveat check are never honoured:
    /// the offscreen target is a single-sampled texture on an already-created context.
    pub fn resolve(options: &ContextOptions) -> Self {
        Self {
            alpha: options.alpha.unwrap_or(true),
            antialias: false,
            depth: options.depth.unwrap_or(true),
            stencil: options.stencil.unwrap_or(false),
            premultiplied_alpha: options.premultiplied_alpha.unwrap_or(true),
            preserve_drawing_buffer: options.preserve_drawing_buffer.unwrap_or(false),
            fail_if_major_performance_caveat: false,
        }
    }
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self::resolve(&ContextOptions::default())
    }
}

/// Changes applied by [`crate::Virtualizer::setup`]. `None` keeps the current value.
pub struct SetupOptions<G: PhysicalGl> {
    pub disable_webgl1: Option<bool>,
    pub compositor_factory: Option<CompositorFactory<G>>,
}

impl<G: PhysicalGl> Default for SetupOptions<G> {
    fn default() -> Self {
        Self {
            disable_webgl1: None,
            compositor_factory: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SetupJson {
    #[serde(alias = "disableWebGL1")]
    disable_webgl1: Option<bool>,
}

impl<G: PhysicalGl> SetupOptions<G> {
    /// Reads the JSON form of the options. A compositor factory cannot be expressed in JSON,
    /// and unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: SetupJson = serde_json::from_str(json)?;
        Ok(Self {
            disable_webgl1: parsed.disable_webgl1,
            compositor_factory: None,
        })
    }
}

impl<G: PhysicalGl> std::fmt::Debug for SetupOptions<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupOptions")
            .field("disable_webgl1", &self.disable_webgl1)
            .field("compositor_factory", &self.compositor_factory.is_some())
            .finish()
    }
}

/// Current engine-wide settings.
pub(crate) struct Settings<G: PhysicalGl> {
    pub disable_webgl1: bool,
    pub compositor_factory: Option<CompositorFactory<G>>,
}

impl<G: PhysicalGl> Default for Settings<G> {
    fn default() -> Self {
        Self {
            disable_webgl1: false,
            compositor_factory: None,
        }
    }
}

impl<G: PhysicalGl> Settings<G> {
    pub fn apply(&mut self, options: SetupOptions<G>) {
        if let Some(disable) = options.disable_webgl1 {
            self.disable_webgl1 = disable;
        }
        if let Some(factory) = options.compositor_factory {
            self.compositor_factory = Some(factory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glmux_gl::SoftGl;
    use pretty_assertions::assert_eq;

    #[test]
    fn attribute_defaults() {
        let attrs = ContextAttributes::default();
        assert!(attrs.alpha);
        assert!(attrs.depth);
        assert!(!attrs.stencil);
        assert!(attrs.premultiplied_alpha);
        assert!(!attrs.preserve_drawing_buffer);
    }

    #[test]
    fn forced_attributes_ignore_requests() {
        let options = ContextOptions::from_json(
            r#"{"antialias": true, "failIfMajorPerformanceCaveat": true, "stencil": true, "powerPreference": "low-power"}"#,
        )
        .unwrap();
        let attrs = ContextAttributes::resolve(&options);
        assert!(!attrs.antialias);
        assert!(!attrs.fail_if_major_performance_caveat);
        assert!(attrs.stencil);
    }

    #[test]
    fn setup_json_accepts_both_spellings() {
        let camel = SetupOptions::<SoftGl>::from_json(r#"{"disableWebGL1": true}"#).unwrap();
        assert_eq!(camel.disable_webgl1, Some(true));
        let snake = SetupOptions::<SoftGl>::from_json(r#"{"disable_webgl1": false, "other": 1}"#).unwrap();
        assert_eq!(snake.disable_webgl1, Some(false));
        let empty = SetupOptions::<SoftGl>::from_json("{}").unwrap();
        assert_eq!(empty.disable_webgl1, None);
    }

    #[test]
    fn omitted_setup_options_keep_prior_values() {
        let mut settings = Settings::<SoftGl>::default();
        settings.apply(SetupOptions {
            disable_webgl1: Some(true),
            ..Default::default()
        });
        settings.apply(SetupOptions::default());
        assert!(settings.disable_webgl1);
    }
}
