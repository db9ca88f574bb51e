use keycap_core::{LabelConfig, parse, plain_text};
use keycap_render::raster::rasterize_svg;
use keycap_render::{
    Align, Baseline, KeyFace, LabelContent, LabelRenderer, LayoutRequest, Rotation, StyleContext,
    SvgSurface,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(keycap_core::Error),
    Render(keycap_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<keycap_core::Error> for CliError {
    fn from(value: keycap_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<keycap_render::Error> for CliError {
    fn from(value: keycap_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Command {
    #[default]
    Parse,
    Plain,
    Layout,
    Render,
    Key,
    Links,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    assets: Option<String>,
    pretty: bool,
    key_input: bool,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    width: f64,
    height: f64,
    font_size: Option<f64>,
    align: Align,
    baseline: Baseline,
    rotate: f64,
    active_href: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "keycap-cli\n\
\n\
USAGE:\n\
  keycap-cli [parse] [--pretty] [<path>|-]\n\
  keycap-cli plain [<path>|-]\n\
  keycap-cli layout [--pretty] [LABEL OPTIONS] [<path>|-]\n\
  keycap-cli render [--format svg|png] [--scale <n>] [--background <css-color>] [--active-href <url>] [--out <path>] [LABEL OPTIONS] [<path>|-]\n\
  keycap-cli key [--format svg|png] [--scale <n>] [--background <css-color>] [--out <path>] [--config <path>] [--assets <dir>] [<key.json>|-]\n\
  keycap-cli links [--pretty] [--key] [LABEL OPTIONS] [<path>|-]\n\
\n\
LABEL OPTIONS:\n\
  --config <path>        label config JSON (camelCase fields, all optional)\n\
  --width <w>            slot width (default 48)\n\
  --height <h>           slot height (default 48)\n\
  --font-size <px>       font size (default from the configured size level)\n\
  --align left|center|right\n\
  --baseline hanging|middle|alphabetic\n\
  --rotate <deg>         rotation about the slot center\n\
  --assets <dir>         directory image sources resolve against (default: input directory)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - One trailing newline of the label input is ignored.\n\
  - render/key print SVG to stdout by default; use --out to write a file.\n\
  - PNG output defaults to writing next to the input file (or ./out.png for stdin).\n\
  - Set KEYCAP_LOG (e.g. KEYCAP_LOG=debug) to log cache and asset activity to stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn next_f64<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<f64, CliError> {
    let v = next_value(it)?
        .parse::<f64>()
        .map_err(|_| CliError::Usage(usage()))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CliError::Usage(usage()))
    }
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_scale: 1.0,
        width: 48.0,
        height: 48.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "parse" => args.command = Command::Parse,
            "plain" => args.command = Command::Plain,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "key" => args.command = Command::Key,
            "links" => args.command = Command::Links,
            "--pretty" => args.pretty = true,
            "--key" => args.key_input = true,
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--assets" => args.assets = Some(next_value(&mut it)?.clone()),
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--active-href" => args.active_href = Some(next_value(&mut it)?.clone()),
            "--format" => {
                args.render_format = next_value(&mut it)?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                args.render_scale = next_value(&mut it)?
                    .parse::<f32>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(args.render_scale.is_finite() && args.render_scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let bg = next_value(&mut it)?;
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--width" => args.width = next_f64(&mut it)?,
            "--height" => args.height = next_f64(&mut it)?,
            "--font-size" => {
                let size = next_f64(&mut it)?;
                if size <= 0.0 {
                    return Err(CliError::Usage(usage()));
                }
                args.font_size = Some(size);
            }
            "--rotate" => args.rotate = next_f64(&mut it)?,
            "--align" => {
                args.align = match next_value(&mut it)?.as_str() {
                    "left" => Align::Left,
                    "center" => Align::Center,
                    "right" => Align::Right,
                    _ => return Err(CliError::Usage(usage())),
                };
            }
            "--baseline" => {
                args.baseline = match next_value(&mut it)?.as_str() {
                    "hanging" => Baseline::Hanging,
                    "middle" => Baseline::Middle,
                    "alphabetic" => Baseline::Alphabetic,
                    _ => return Err(CliError::Usage(usage())),
                };
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("KEYCAP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // A second init (e.g. from a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// Label files conventionally end with a newline that is not part of the label.
fn label_text(raw: &str) -> &str {
    raw.strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .unwrap_or(raw)
}

fn load_config(path: Option<&str>) -> Result<LabelConfig, CliError> {
    match path {
        None => Ok(LabelConfig::default()),
        Some(path) => Ok(LabelConfig::from_json_str(&std::fs::read_to_string(path)?)?),
    }
}

fn write_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> PathBuf {
    match input {
        Some(path) if path != "-" => PathBuf::from(path).with_extension(ext),
        _ => PathBuf::from(format!("out.{ext}")),
    }
}

fn assets_dir(args: &Args) -> PathBuf {
    if let Some(dir) = &args.assets {
        return PathBuf::from(dir);
    }
    match args.input.as_deref() {
        Some(path) if path != "-" => Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        _ => PathBuf::from("."),
    }
}

/// Layout request for a `width` x `height` slot anchored according to `align` and `baseline`.
fn slot_request(args: &Args, config: &LabelConfig) -> LayoutRequest {
    let font_size = args
        .font_size
        .unwrap_or_else(|| keycap_render::font_size(config.default_size_level, false));
    let x = match args.align {
        Align::Left => 0.0,
        Align::Center => args.width / 2.0,
        Align::Right => args.width,
    };
    let y = match args.baseline {
        Baseline::Hanging => 0.0,
        Baseline::Middle => args.height / 2.0,
        Baseline::Alphabetic => args.height,
    };
    LayoutRequest {
        x,
        y,
        max_width: args.width,
        max_height: args.height,
        align: args.align,
        baseline: args.baseline,
        ..LayoutRequest::from_config(config, font_size)
    }
}

fn slot_rotation(args: &Args) -> Rotation {
    Rotation::new(args.rotate, args.width / 2.0, args.height / 2.0)
}

/// Serves queued asset loads from local files and reports whether anything settled.
///
/// Remote URLs are not fetched; they settle as failed so rendering does not wait on them.
fn settle_local_assets(renderer: &mut LabelRenderer, dir: &Path) -> bool {
    let urls = renderer.loader_mut().drain();
    if urls.is_empty() {
        return false;
    }
    for url in urls {
        let outcome = if url.contains("://") {
            Err(format!("remote asset not fetched: {url}"))
        } else {
            let path = dir.join(&url);
            tracing::debug!(url = %url, path = %path.display(), "loading local asset");
            std::fs::read(&path).map_err(|err| format!("{}: {err}", path.display()))
        };
        renderer.complete_asset(&url, outcome);
    }
    renderer.flush_frame()
}

/// Draws a label into a fresh SVG document, re-rendering once if local assets arrive.
fn render_label_svg(
    renderer: &mut LabelRenderer,
    args: &Args,
    text: &str,
) -> (String, LabelContent) {
    let config = renderer.config().clone();
    let request = slot_request(args, &config);
    let ctx = StyleContext::from_config(&config);
    let rotation = slot_rotation(args);
    renderer.set_active_href(args.active_href.clone());

    let draw = |renderer: &mut LabelRenderer| {
        let mut surface = new_surface(args.width, args.height, args.background.as_deref());
        let content = renderer.render_label(&mut surface, text, &request, rotation, &ctx);
        (surface.finish(), content)
    };

    let mut out = draw(renderer);
    if settle_local_assets(renderer, &assets_dir(args)) {
        out = draw(renderer);
    }
    out
}

fn render_key_svg(renderer: &mut LabelRenderer, args: &Args, face: &KeyFace) -> String {
    let width = face.x + face.width;
    let height = face.y + face.height;
    let draw = |renderer: &mut LabelRenderer| {
        let mut surface = new_surface(width, height, args.background.as_deref());
        renderer.render_key(&mut surface, face);
        surface.finish()
    };

    let mut svg = draw(renderer);
    if settle_local_assets(renderer, &assets_dir(args)) {
        svg = draw(renderer);
    }
    svg
}

fn new_surface(width: f64, height: f64, background: Option<&str>) -> SvgSurface {
    let surface = SvgSurface::new(width, height);
    match background {
        Some(bg) => surface.with_background(bg),
        None => surface,
    }
}

fn emit_svg(svg: &str, args: &Args) -> Result<(), CliError> {
    match args.render_format {
        RenderFormat::Svg => write_text(svg, args.out.as_deref()),
        RenderFormat::Png => {
            let bytes = rasterize_svg(svg, args.render_scale)?.encode_png()?;
            let out = args.out.clone().unwrap_or_else(|| {
                default_raster_out_path(args.input.as_deref(), "png")
                    .to_string_lossy()
                    .to_string()
            });
            if out == "-" {
                use std::io::Write;
                std::io::stdout().lock().write_all(&bytes)?;
            } else {
                std::fs::write(out, bytes)?;
            }
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let raw = read_input(args.input.as_deref())?;
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Parse => {
            let nodes = parse(label_text(&raw));
            write_json(&nodes, args.pretty)
        }
        Command::Plain => {
            println!("{}", plain_text(&parse(label_text(&raw))));
            Ok(())
        }
        Command::Layout => {
            let mut renderer = LabelRenderer::new(config)?;
            let request = slot_request(&args, renderer.config());
            let content = renderer.layout_label(label_text(&raw), &request);
            write_json(&content, args.pretty)
        }
        Command::Render => {
            let mut renderer = LabelRenderer::new(config)?;
            let (svg, _) = render_label_svg(&mut renderer, &args, label_text(&raw));
            emit_svg(&svg, &args)
        }
        Command::Key => {
            let face: KeyFace = serde_json::from_str(&raw)?;
            let mut renderer = LabelRenderer::new(config)?;
            let svg = render_key_svg(&mut renderer, &args, &face);
            emit_svg(&svg, &args)
        }
        Command::Links => {
            let mut renderer = LabelRenderer::new(config)?;
            if args.key_input {
                let face: KeyFace = serde_json::from_str(&raw)?;
                render_key_svg(&mut renderer, &args, &face);
            } else {
                render_label_svg(&mut renderer, &args, label_text(&raw));
            }
            write_json(&renderer.links().records(), args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging();
    tracing::debug!(command = ?args.command, input = ?args.input, "starting");

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
