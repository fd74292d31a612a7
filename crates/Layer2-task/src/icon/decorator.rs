//! Icon decoration
//!
//! A semi-transparent band is laid over the bottom of the icon and the
//! version label is written inside it. All sizes are fractions of the icon
//! height so every resolution of the same icon looks alike.

use crate::executor::{CommandSpec, Executor};
use async_trait::async_trait;
use buildkit_foundation::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Draws a version label onto an icon
#[async_trait]
pub trait IconDecorator: Send + Sync {
    /// Read `source`, draw `label`, write the result to `dest`
    async fn decorate(&self, source: &Path, dest: &Path, label: &str) -> Result<()>;
}

/// Band and text parameters, as fractions of the icon height
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationStyle {
    /// Height of the band
    pub band_ratio: f64,

    pub band_opacity: f64,

    /// Text point size
    pub text_ratio: f64,

    /// Distance between the text and the bottom edge
    pub text_offset_ratio: f64,

    pub text_color: String,

    pub font: String,
}

impl Default for DecorationStyle {
    fn default() -> Self {
        Self {
            band_ratio: 0.225,
            band_opacity: 0.75,
            text_ratio: 0.11,
            text_offset_ratio: 0.05,
            text_color: "#FFF".to_string(),
            font: "Helvetica-Bold".to_string(),
        }
    }
}

/// Pixel geometry for one icon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandGeometry {
    pub width: u32,
    pub height: u32,

    /// First row covered by the band
    pub band_top: f64,

    pub point_size: f64,

    /// Text offset from the bottom edge
    pub text_offset: f64,
}

impl DecorationStyle {
    pub fn geometry(&self, width: u32, height: u32) -> BandGeometry {
        let h = f64::from(height);
        BandGeometry {
            width,
            height,
            band_top: h - h * self.band_ratio,
            point_size: h * self.text_ratio,
            text_offset: h * self.text_offset_ratio,
        }
    }
}

/// [`IconDecorator`] driving ImageMagick's `magick` command
pub struct MagickDecorator {
    executor: Arc<dyn Executor>,
    program: String,
    style: DecorationStyle,
}

impl MagickDecorator {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            program: "magick".to_string(),
            style: DecorationStyle::default(),
        }
    }

    async fn dimensions(&self, source: &Path) -> Result<(u32, u32)> {
        let spec = CommandSpec::new(&self.program)
            .args(["identify", "-format", "%w %h\n"])
            .arg(source.to_string_lossy());
        let output = self.executor.execute(&spec).await?;
        if !output.success() {
            return Err(Error::Process(format!(
                "{} identify failed for {}: {}",
                self.program,
                source.display(),
                output.stderr.trim()
            )));
        }
        parse_dimensions(&output.stdout).ok_or_else(|| {
            Error::Process(format!(
                "unexpected identify output for {}: {:?}",
                source.display(),
                output.stdout
            ))
        })
    }

    /// Arguments of the `magick` call that renders the decorated icon
    pub fn render_args(
        &self,
        source: &Path,
        dest: &Path,
        label: &str,
        geometry: &BandGeometry,
    ) -> Vec<String> {
        vec![
            source.to_string_lossy().into_owned(),
            "-fill".to_string(),
            format!("rgba(0,0,0,{})", self.style.band_opacity),
            "-draw".to_string(),
            format!(
                "rectangle 0,{:.1} {},{}",
                geometry.band_top, geometry.width, geometry.height
            ),
            "-gravity".to_string(),
            "South".to_string(),
            "-font".to_string(),
            self.style.font.clone(),
            "-pointsize".to_string(),
            format!("{:.1}", geometry.point_size),
            "-stroke".to_string(),
            "none".to_string(),
            "-fill".to_string(),
            self.style.text_color.clone(),
            "-annotate".to_string(),
            format!("+0+{:.1}", geometry.text_offset),
            escape_annotation(label),
            dest.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl IconDecorator for MagickDecorator {
    async fn decorate(&self, source: &Path, dest: &Path, label: &str) -> Result<()> {
        let (width, height) = self.dimensions(source).await?;
        let geometry = self.style.geometry(width, height);
        debug!(
            "Decorating {} ({}x{}) with {:?}",
            dest.display(),
            width,
            height,
            label
        );

        let spec = CommandSpec::new(&self.program).args(self.render_args(source, dest, label, &geometry));
        let output = self.executor.execute(&spec).await?;
        if !output.success() {
            return Err(Error::Process(format!(
                "{} failed to decorate {}: {}",
                self.program,
                dest.display(),
                output.stderr.trim()
            )));
        }
        Ok(())
    }
}

/// First `"<width> <height>"` pair of identify output
fn parse_dimensions(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some((width, height))
}

/// `-annotate` text treats `%` as an escape and a leading `@` as a file name
fn escape_annotation(label: &str) -> String {
    let escaped = label.replace('%', "%%");
    if escaped.starts_with('@') {
        format!("\\{}", escaped)
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use std::sync::Mutex;

    struct Scripted {
        calls: Mutex<Vec<CommandSpec>>,
    }

    #[async_trait]
    impl Executor for Scripted {
        async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(command.clone());
            let stdout = if command.args.first().map(String::as_str) == Some("identify") {
                "180 180\n".to_string()
            } else {
                String::new()
            };
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout,
                ..Default::default()
            })
        }

        fn is_available(&self, _program: &str) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[test]
    fn test_geometry_is_proportional_to_height() {
        let style = DecorationStyle::default();

        let g = style.geometry(1000, 1000);
        assert!((g.band_top - 775.0).abs() < 1e-9);
        assert!((g.point_size - 110.0).abs() < 1e-9);
        assert!((g.text_offset - 50.0).abs() < 1e-9);

        let small = style.geometry(40, 40);
        assert!((small.point_size / 40.0 - g.point_size / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_sits_inside_band() {
        let style = DecorationStyle::default();
        let g = style.geometry(120, 120);
        let text_top = g.text_offset + g.point_size;
        assert!(text_top < f64::from(g.height) - g.band_top);
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("120 120\n"), Some((120, 120)));
        assert_eq!(parse_dimensions("60 40\n60 40\n"), Some((60, 40)));
        assert_eq!(parse_dimensions("garbage"), None);
    }

    #[test]
    fn test_escape_annotation() {
        assert_eq!(escape_annotation("1.0 (12)"), "1.0 (12)");
        assert_eq!(escape_annotation("100%"), "100%%");
        assert_eq!(escape_annotation("@file"), "\\@file");
    }

    #[tokio::test]
    async fn test_decorate_identifies_then_renders() {
        let executor = Arc::new(Scripted {
            calls: Mutex::new(Vec::new()),
        });
        let decorator = MagickDecorator::new(executor.clone());

        decorator
            .decorate(
                Path::new("/icons/_Original-Icon.png"),
                Path::new("/icons/Icon.png"),
                "1.2 (7)",
            )
            .await
            .unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], "identify");
        assert_eq!(calls[0].args.last().unwrap(), "/icons/_Original-Icon.png");

        let render = &calls[1].args;
        assert_eq!(render.first().unwrap(), "/icons/_Original-Icon.png");
        assert_eq!(render.last().unwrap(), "/icons/Icon.png");
        assert!(render.contains(&"rectangle 0,139.5 180,180".to_string()));
        assert!(render.contains(&"19.8".to_string()));
        assert!(render.contains(&"+0+9.0".to_string()));
        assert!(render.contains(&"1.2 (7)".to_string()));
    }
}
