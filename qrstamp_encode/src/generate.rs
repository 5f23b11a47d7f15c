use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use log::debug;
use qrstamp_core::{CompositionOptions, GeneratorConfig, LogoOptions, Symbol, SymbolSpec};

use crate::compose::{load_logo, LogoCompositor, TitleCompositor};
use crate::font::TitleFont;
use crate::output::{deliver, encode_raster, Generated, OutputFormat, OutputTarget};
use crate::render::{hex, svg_header, Rasterizer, SvgRenderer};
use crate::{Error, SymbolEncoder};

/// Runs the whole pipeline: encode, rasterize, add the title, overlay the logo, then encode the
/// image and hand it to its target.
///
/// A generator holds no mutable state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    font: Option<TitleFont>,
}

impl Generator {
    /// Construct a new [Generator] with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    /// Construct a new [Generator] whose defaults come from `config`. A custom font list is
    /// resolved here, once.
    pub fn with_config(config: GeneratorConfig) -> Self {
        let font = config.composition.fonts.as_deref().map(TitleFont::resolve);
        Self { config, font }
    }

    /// Construct a new [Generator] from a JSON config file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::with_config(GeneratorConfig::load_json(path)?))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a symbol for `content`. `spec` and `options` replace the configured defaults when
    /// given.
    /// # Example
    /// ```
    /// use qrstamp_encode::{Generated, Generator, OutputFormat};
    /// let generated = Generator::new()
    ///     .generate("https://example.com", OutputFormat::Png, None, None)
    ///     .unwrap();
    /// assert!(matches!(generated, Generated::Bytes(_)));
    /// ```
    pub fn generate<C, T>(
        &self,
        content: C,
        target: T,
        spec: Option<&SymbolSpec>,
        options: Option<&CompositionOptions>,
    ) -> Result<Generated, Error>
    where
        C: AsRef<str>,
        T: Into<OutputTarget>,
    {
        self.run(content.as_ref(), &target.into(), None, spec, options)
    }

    /// Same as [Generator::generate], with `logo` pasted at the center of the final image, title
    /// banner included.
    pub fn generate_with_logo<C, T>(
        &self,
        content: C,
        target: T,
        logo: &LogoOptions,
        spec: Option<&SymbolSpec>,
        options: Option<&CompositionOptions>,
    ) -> Result<Generated, Error>
    where
        C: AsRef<str>,
        T: Into<OutputTarget>,
    {
        self.run(content.as_ref(), &target.into(), Some(logo), spec, options)
    }

    /// Encode `content` with `spec`, the configured one if `None`.
    pub fn encode(&self, content: &str, spec: Option<&SymbolSpec>) -> Result<Symbol, Error> {
        let spec = spec.unwrap_or(&self.config.symbol);
        let mut encoder = SymbolEncoder::new().with_ecl(spec.ecl);
        if let Some(version) = spec.version {
            encoder = encoder.with_version_in(version..);
        }
        Ok(encoder.encode(content)?)
    }

    fn run(
        &self,
        content: &str,
        target: &OutputTarget,
        logo: Option<&LogoOptions>,
        spec: Option<&SymbolSpec>,
        options: Option<&CompositionOptions>,
    ) -> Result<Generated, Error> {
        let spec = spec.unwrap_or(&self.config.symbol);
        let options = options.unwrap_or(&self.config.composition);
        let format = target.format()?;
        let rasterizer = Rasterizer::from_spec(spec)?;
        let logo = logo
            .map(|logo| Ok::<_, Error>((LogoCompositor::new(logo.size_fraction)?, &logo.source)))
            .transpose()?;

        let symbol = self.encode(content, Some(spec))?;
        debug!(
            "symbol {} ({}x{} modules) for {:?}",
            symbol.meta().version,
            symbol.grid().size(),
            symbol.grid().size(),
            target
        );
        let logo = match logo {
            Some((compositor, source)) => Some((compositor, load_logo(source)?)),
            None => None,
        };

        let resolved;
        let font = match options.fonts.as_deref() {
            Some(fonts) if Some(fonts) != self.config.composition.fonts.as_deref() => {
                resolved = TitleFont::resolve(fonts);
                &resolved
            }
            _ => self.font(),
        };
        let title = TitleCompositor::new(font, options)?;

        let bytes = match format {
            OutputFormat::Svg => {
                let logo = logo.as_ref().map(|(compositor, image)| (*compositor, image));
                self.svg(&symbol, rasterizer, logo, &title, options)?.into_bytes()
            }
            _ => {
                let image = rasterizer.render(&symbol)?;
                let mut image = title.add_title(image, options.title());
                if let Some((compositor, logo)) = &logo {
                    image = compositor.add_logo(image, logo);
                }
                debug!("image {}x{}", image.width(), image.height());
                encode_raster(image, format)?
            }
        };
        deliver(target, bytes)
    }

    fn font(&self) -> &TitleFont {
        self.font.as_ref().unwrap_or_else(|| TitleFont::system_default())
    }

    /// Vector flavor of the pipeline. The title is left to the viewer's fonts and the logo is
    /// embedded as PNG data.
    fn svg(
        &self,
        symbol: &Symbol,
        rasterizer: Rasterizer,
        logo: Option<(LogoCompositor, &DynamicImage)>,
        title: &TitleCompositor,
        options: &CompositionOptions,
    ) -> Result<String, Error> {
        let renderer = SvgRenderer::new(rasterizer);
        let side = renderer.image_side(symbol.grid().size())?;
        let banner = match options.title() {
            Some(_) => title.banner_height(),
            None => 0,
        };

        let mut out = svg_header(side, side + banner);
        if let Some(title) = options.title() {
            let _ = writeln!(
                out,
                "\t<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                side,
                banner,
                hex(options.title_background.rgb())
            );
            let _ = writeln!(
                out,
                "\t<text x=\"{}\" y=\"{}\" fill=\"{}\" font-family=\"DejaVu Sans, Arial, sans-serif\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
                side / 2,
                banner / 2,
                hex(options.title_color.rgb()),
                options.font_size,
                escape_xml(title)
            );
        }
        renderer.write_symbol(&mut out, symbol.grid(), banner)?;

        if let Some((compositor, image)) = logo {
            let placement = compositor.placement(side, side + banner, image.width(), image.height());
            let mut png = Vec::new();
            image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            let _ = writeln!(
                out,
                "\t<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"data:image/png;base64,{}\"/>",
                placement.x,
                placement.y,
                placement.width,
                placement.height,
                base64::engine::general_purpose::STANDARD.encode(&png)
            );
        }
        out.push_str("</svg>\n");
        Ok(out)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
