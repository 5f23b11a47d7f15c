use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use itertools::Itertools;
use log::{debug, LevelFilter};

use qrstamp_core::{Color, Ecl, GeneratorConfig, LogoOptions, SymbolSpec, Version};
use qrstamp_encode::output::{sanitize_filename, write_atomic};
use qrstamp_encode::payload::{self, Contact, Event, WifiSecurity};
use qrstamp_encode::validate::{self, Report};
use qrstamp_encode::{AsciiRenderer, Error, Generated, Generator};

#[derive(Parser)]
#[command(name = "qrstamp")]
#[command(version)]
#[command(propagate_version = true)]
#[command(about = "Generate QR codes with an optional title banner and logo", long_about = None)]
struct Cli {
    /// Log more, -v for info and -vv for debug. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// JSON file with default settings. Command line flags override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Style {
    #[arg(long, help = "Title to display above the QR code")]
    title: Option<String>,
    #[arg(long, help = "Smallest QR code version to use (1-40)")]
    qr_version: Option<i64>,
    #[arg(long, help = "Error correction level: L, M, Q or H")]
    ecl: Option<Ecl>,
    #[arg(long, help = "Size of each module in pixels")]
    box_size: Option<i64>,
    #[arg(long, help = "Border size in modules", allow_hyphen_values = true)]
    border: Option<i64>,
    #[arg(long, help = "Foreground color (color of the modules)")]
    fg_color: Option<String>,
    #[arg(long, help = "Background color")]
    bg_color: Option<String>,
}

#[derive(Args)]
struct Destination {
    #[arg(
        short,
        long,
        help = "Output file or a text preview on stdout if unspecified",
        long_help = "Output file or a text preview on stdout if unspecified. The output format is determined based \
        on the extension. Supported extensions are:\n\
        * text: .txt\n\
        * images: .png, .jpg, .jpeg, .gif, .svg\n\
        A directory receives a PNG file named after the title."
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Logo image to paste at the center (png, jpg, jpeg or gif)")]
    logo: Option<PathBuf>,
    #[arg(long, help = "Logo size as a fraction of the QR code size, in (0, 1)")]
    logo_size: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a QR code from arbitrary content.
    Generate {
        #[arg(long, conflicts_with = "file", help = "Content to encode")]
        content: Option<String>,
        #[arg(long, help = "Read the content from a file, or stdin if neither is given")]
        file: Option<PathBuf>,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a QR code with a logo in the center.
    Logo {
        #[arg(long, help = "Content to encode")]
        content: String,
        #[arg(short, long, help = "Output image file")]
        output: PathBuf,
        #[arg(long, help = "Logo image path")]
        logo: PathBuf,
        #[arg(long, default_value_t = 0.2, help = "Logo size as a fraction of the QR code size")]
        logo_size: f32,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a QR code that joins a WiFi network.
    Wifi {
        #[arg(long, help = "Network name")]
        ssid: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "WPA", help = "Security type: WPA, WEP or nopass")]
        security: WifiSecurity,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a contact card (vCard) QR code.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a QR code that composes an e-mail.
    Email {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a QR code pointing to a location.
    Geo {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
    /// Generate a calendar event QR code.
    Event {
        #[arg(long)]
        summary: String,
        #[arg(long, help = "Start, e.g. 20250131T090000Z")]
        start: String,
        #[arg(long, help = "End, e.g. 20250131T100000Z")]
        end: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        destination: Destination,
        #[command(flatten)]
        style: Style,
    },
}

/// What to encode, with the title used when none is given.
struct Payload {
    content: String,
    default_title: Option<String>,
    /// Print the detected content type, only meaningful for free text.
    detect: bool,
}

impl Payload {
    fn structured(content: String, default_title: String) -> Self {
        Self {
            content,
            default_title: Some(default_title),
            detect: false,
        }
    }
}

enum Output {
    Stdout,
    Text(PathBuf),
    Image(PathBuf),
}

impl Output {
    fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            None => Output::Stdout,
            Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")) => {
                Output::Text(path)
            }
            Some(path) => Output::Image(path),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }
    let mut text = String::new();
    match file {
        Some(path) => {
            std::fs::File::open(&path)
                .with_context(|| format!("cannot open '{}'", path.display()))?
                .read_to_string(&mut text)?;
        }
        None => {
            std::io::stdin().read_to_string(&mut text)?;
        }
    };
    // A single trailing line break is not part of the content.
    let trimmed = text.strip_suffix('\n').unwrap_or(&text);
    Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string())
}

/// Check every user input at once, printing warnings and failing on errors.
fn check(
    content: &str,
    output: &Output,
    logo: Option<&LogoOptions>,
    style: &Style,
) -> Result<()> {
    let mut report = Report::new().and(validate::validate_content(content));
    match output {
        Output::Image(path) => report.merge(validate::validate_output_path(path)),
        Output::Text(_) | Output::Stdout if logo.is_some() => {
            report.error("output", "a logo needs an image output file");
        }
        _ => {}
    }
    if let Some(logo) = logo {
        report.merge(validate::validate_logo_path(&logo.source));
        report.merge(validate::validate_logo_size(logo.size_fraction));
    }
    if let Some(color) = &style.fg_color {
        report.merge(validate::validate_color("fg_color", color));
    }
    if let Some(color) = &style.bg_color {
        report.merge(validate::validate_color("bg_color", color));
    }
    report.merge(validate::validate_qr_parameters(
        style.qr_version,
        style.box_size,
        style.border,
    ));

    for warning in report.warnings() {
        eprintln!("{}", warning);
    }
    if !report.is_valid() {
        bail!(
            "invalid input: {}",
            report.errors().map(|issue| &issue.message).join("; ")
        );
    }
    Ok(())
}

/// Apply the command line flags on top of the configured symbol spec. Inputs are validated.
fn symbol_spec(config: &GeneratorConfig, style: &Style) -> Result<SymbolSpec> {
    let mut spec = config.symbol.clone();
    if let Some(version) = style.qr_version {
        let version = u8::try_from(version)?;
        spec.version = Some(Version::try_from(version).map_err(anyhow::Error::msg)?);
    }
    if let Some(ecl) = style.ecl {
        spec.ecl = ecl;
    }
    if let Some(box_size) = style.box_size {
        spec.box_size = u32::try_from(box_size)?;
    }
    if let Some(border) = style.border {
        spec.border = u32::try_from(border)?;
    }
    if let Some(color) = &style.fg_color {
        spec.foreground = color.parse::<Color>().map_err(Error::from)?;
    }
    if let Some(color) = &style.bg_color {
        spec.background = color.parse::<Color>().map_err(Error::from)?;
    }
    Ok(spec)
}

fn run(
    generator: &Generator,
    payload: Payload,
    output: Option<PathBuf>,
    logo: Option<LogoOptions>,
    style: Style,
) -> Result<()> {
    let mut options = generator.config().composition.clone();
    if let Some(title) = style.title.clone().or(payload.default_title) {
        options.title = Some(title);
    }
    // A directory gets a PNG named after the title.
    let output = Output::from_path(output.map(|path| {
        if path.is_dir() {
            let name = sanitize_filename(options.title().unwrap_or_default(), 50);
            path.join(name).with_extension("png")
        } else {
            path
        }
    }));
    check(&payload.content, &output, logo.as_ref(), &style)?;
    let spec = symbol_spec(generator.config(), &style)?;
    debug!("symbol spec: {:?}", spec);

    match output {
        Output::Stdout => {
            let symbol = generator.encode(&payload.content, Some(&spec))?;
            let mut stdout = std::io::stdout().lock();
            if let Some(title) = options.title() {
                writeln!(stdout, "{}", title)?;
            }
            ascii_renderer(&style).render(&mut stdout, &symbol)?;
        }
        Output::Text(path) => {
            let symbol = generator.encode(&payload.content, Some(&spec))?;
            let mut text = Vec::new();
            ascii_renderer(&style).render(&mut text, &symbol)?;
            write_atomic(&path, &text)?;
            println!("QR code generated successfully: {}", path.display());
        }
        Output::Image(path) => {
            let generated = match &logo {
                Some(logo) => generator.generate_with_logo(
                    &payload.content,
                    path,
                    logo,
                    Some(&spec),
                    Some(&options),
                )?,
                None => generator.generate(&payload.content, path, Some(&spec), Some(&options))?,
            };
            if let Generated::Path(path) = generated {
                println!("QR code generated successfully: {}", path.display());
            }
        }
    }
    if payload.detect {
        println!(
            "Content type detected: {}",
            payload::detect_content_type(&payload.content)
        );
    }
    Ok(())
}

fn ascii_renderer(style: &Style) -> AsciiRenderer {
    let renderer = AsciiRenderer::new();
    match style.border.and_then(|border| usize::try_from(border).ok()) {
        Some(border) => renderer.with_border(border),
        None => renderer,
    }
}

fn logo_options(path: Option<PathBuf>, size: Option<f32>) -> Option<LogoOptions> {
    path.map(|path| {
        let logo = LogoOptions::new(path);
        match size {
            Some(size) => logo.with_size_fraction(size),
            None => logo,
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let generator = match &cli.config {
        Some(path) => Generator::from_json(path)
            .with_context(|| format!("cannot load config '{}'", path.display()))?,
        None => Generator::new(),
    };

    match cli.command {
        Command::Generate {
            content,
            file,
            destination,
            style,
        } => {
            let payload = Payload {
                content: read_content(content, file)?,
                default_title: None,
                detect: true,
            };
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
        Command::Logo {
            content,
            output,
            logo,
            logo_size,
            style,
        } => {
            let payload = Payload {
                content,
                default_title: None,
                detect: true,
            };
            let logo = logo_options(Some(logo), Some(logo_size));
            run(&generator, payload, Some(output), logo, style)
        }
        Command::Wifi {
            ssid,
            password,
            security,
            destination,
            style,
        } => {
            let content = payload::wifi(&ssid, password.as_deref(), security);
            let payload = Payload::structured(content, format!("WiFi: {}", ssid));
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
        Command::Contact {
            name,
            phone,
            email,
            company,
            job_title,
            website,
            destination,
            style,
        } => {
            let contact = Contact {
                name,
                phone,
                email,
                company,
                job_title,
                website,
            };
            let payload =
                Payload::structured(contact.to_vcard(), format!("Contact: {}", contact.name));
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
        Command::Email {
            to,
            subject,
            body,
            destination,
            style,
        } => {
            let content = payload::email(&to, subject.as_deref(), body.as_deref());
            let payload = Payload::structured(content, format!("Email: {}", to));
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
        Command::Geo {
            lat,
            lon,
            destination,
            style,
        } => {
            let payload =
                Payload::structured(payload::geo(lat, lon), format!("Location: {}, {}", lat, lon));
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
        Command::Event {
            summary,
            start,
            end,
            location,
            description,
            destination,
            style,
        } => {
            let event = Event {
                summary,
                start,
                end,
                location,
                description,
            };
            let payload =
                Payload::structured(event.to_vevent(), format!("Event: {}", event.summary));
            let logo = logo_options(destination.logo, destination.logo_size);
            run(&generator, payload, destination.output, logo, style)
        }
    }
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    fn style(args: &[&str]) -> Style {
        let mut argv = vec!["qrstamp", "generate", "--content", "x"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Generate { style, .. } => style,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
        assert!(Cli::try_parse_from(["qrstamp", "generate", "--content", "x", "--qr-version", "3"]).is_ok());
        let err = Cli::try_parse_from(["qrstamp", "--version"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_bad_color_is_invalid_color() {
        let err = symbol_spec(&GeneratorConfig::default(), &style(&["--bg-color", "#12345"])).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidColor(_))));
    }

    #[test]
    fn test_output_kind() {
        assert!(matches!(Output::from_path(None), Output::Stdout));
        assert!(matches!(Output::from_path(Some("a.TXT".into())), Output::Text(_)));
        assert!(matches!(Output::from_path(Some("a.svg".into())), Output::Image(_)));
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = GeneratorConfig::default();
        config.symbol.box_size = 7;
        config.symbol.border = 2;
        let spec = symbol_spec(
            &config,
            &style(&["--qr-version", "5", "--ecl", "h", "--border", "0", "--fg-color", "navy"]),
        );
        // Unknown colors fail.
        assert!(spec.is_err());

        let spec = symbol_spec(
            &config,
            &style(&["--qr-version", "5", "--ecl", "h", "--border", "0", "--fg-color", "red"]),
        )
        .unwrap();
        assert_eq!(spec.version, Some(Version::V05));
        assert_eq!(spec.ecl, Ecl::H);
        assert_eq!(spec.box_size, 7);
        assert_eq!(spec.border, 0);
        assert_eq!(spec.foreground, "red".parse().unwrap());
        assert_eq!(spec.background, Color::WHITE);
    }

    #[test]
    fn test_check_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        let output = Output::Image(dir.path().join("out.bmp"));
        let err = check("", &output, None, &style(&["--box-size", "0", "--border", "-1"]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("content cannot be empty"));
        assert!(err.contains("unsupported file format 'bmp'"));
        assert!(err.contains("box size"));
        assert!(err.contains("border"));

        let output = Output::Image(dir.path().join("out.png"));
        assert!(check("hello", &output, None, &style(&[])).is_ok());
    }

    #[test]
    fn test_logo_needs_image_output() {
        let logo = LogoOptions::new("logo.png");
        assert!(check("hello", &Output::Stdout, Some(&logo), &style(&[])).is_err());
    }

    #[test]
    fn test_read_content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.txt");
        std::fs::write(&path, "line one\nline two\n").unwrap();
        assert_eq!(read_content(None, Some(path)).unwrap(), "line one\nline two");
        assert_eq!(read_content(Some("given".into()), None).unwrap(), "given");
    }

    #[test]
    fn test_wifi_command_parses() {
        let cli = Cli::try_parse_from([
            "qrstamp", "-vv", "wifi", "--ssid", "Net", "--security", "nopass", "-o", "wifi.png",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Wifi {
                ssid,
                security,
                destination,
                ..
            } => {
                assert_eq!(ssid, "Net");
                assert_eq!(security, WifiSecurity::NoPass);
                assert_eq!(destination.output, Some(PathBuf::from("wifi.png")));
            }
            _ => panic!("expected the wifi command"),
        }
    }
}
