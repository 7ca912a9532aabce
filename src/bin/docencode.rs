//! Command line front end for the document encoders.
//!
//! Parses an HTML or XML file and encodes the whole document, one element,
//! or a range between two boundary points, optionally through the
//! clipboard encoder.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use docencode::encoder::EncodedContext;
use docencode::{
    Boundary, CopyEncoder, Document, DocumentEncoder, EncodeError, EncoderFlags, NodeId, Range,
    Selection,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// docencode -- serialize documents, elements and ranges.
#[derive(Parser, Debug)]
#[command(name = "docencode", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input file (use `-` for stdin).
    file: String,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    // -- Input -------------------------------------------------------------
    /// Parse input as XML instead of HTML.
    #[arg(long)]
    xml: bool,

    /// Base URL for resolving relative links.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Treat the document as having scripting disabled.
    #[arg(long)]
    no_script: bool,

    // -- Scope -------------------------------------------------------------
    /// Encode only the element with this id.
    #[arg(long, value_name = "ID", conflicts_with_all = ["start", "end"])]
    node: Option<String>,

    /// With --node, encode the element's children but not the element.
    #[arg(long, requires = "node")]
    children: bool,

    /// Range start as `ID[/CHILD]:OFFSET`.
    #[arg(long, value_name = "POINT", requires = "end")]
    start: Option<Endpoint>,

    /// Range end as `ID[/CHILD]:OFFSET`.
    #[arg(long, value_name = "POINT", requires = "start")]
    end: Option<Endpoint>,

    // -- Output ------------------------------------------------------------
    /// Output MIME type.
    #[arg(long, value_name = "MIME", default_value = "text/html")]
    mime: String,

    /// Output character set label.
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Stop after this many characters of output.
    #[arg(long, value_name = "CHARS")]
    max_length: Option<usize>,

    /// Hard-wrap plain text at this column.
    #[arg(long, value_name = "COLUMN")]
    wrap: Option<usize>,

    /// Skip content hidden with `hidden` or `display: none`.
    #[arg(long)]
    skip_invisible: bool,

    /// Keep whitespace as-is in plain text output.
    #[arg(long)]
    preformatted: bool,

    /// Omit line breaks that render nothing.
    #[arg(long)]
    drop_invisible_breaks: bool,

    /// Resolve link attributes against the base URL.
    #[arg(long)]
    absolute_links: bool,

    /// Walk into shadow trees and slotted content.
    #[arg(long)]
    cross_shadow: bool,

    // -- Clipboard ---------------------------------------------------------
    /// Encode through the clipboard encoder (range promotion, absolute links).
    #[arg(long)]
    copy: bool,

    /// Also print the ancestor context markup and depth info.
    #[arg(long)]
    context: bool,
}

/// A boundary point named by element id, optional child index and offset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    id: String,
    child: Option<usize>,
    offset: usize,
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, offset) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected ID[/CHILD]:OFFSET, got `{s}`"))?;
        let offset = offset
            .parse()
            .map_err(|e| format!("bad offset `{offset}`: {e}"))?;
        let (id, child) = match target.split_once('/') {
            Some((id, child)) => {
                let child = child
                    .parse()
                    .map_err(|e| format!("bad child index `{child}`: {e}"))?;
                (id, Some(child))
            }
            None => (target, None),
        };
        if id.is_empty() {
            return Err(format!("missing element id in `{s}`"));
        }
        Ok(Self {
            id: id.to_string(),
            child,
            offset,
        })
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_INPUT_ERROR: u8 = 1;
const EXIT_ENCODE_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input = match read_input(&cli.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: failed to read: {e}", cli.file);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    let parsed = if cli.xml {
        Document::parse_xml(&input)
    } else {
        Document::parse_html(&input)
    };
    let mut doc = match parsed {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };
    if cli.base_url.is_some() {
        doc.base_url.clone_from(&cli.base_url);
    }
    if cli.no_script {
        doc.scripting_enabled = false;
    }

    let scope = match resolve_scope(&cli, &doc) {
        Ok(scope) => scope,
        Err(msg) => {
            eprintln!("{}: {msg}", cli.file);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    match encode(&cli, &doc, scope) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            ExitCode::from(EXIT_ENCODE_ERROR)
        }
    }
}

/// Installs a stderr subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<String> {
    if filename == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(filename)
    }
}

// ---------------------------------------------------------------------------
// Scope resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Scope {
    Document,
    Node(NodeId),
    Children(NodeId),
    Range(Range),
}

fn resolve_scope(cli: &Cli, doc: &Document) -> Result<Scope, String> {
    if let Some(ref id) = cli.node {
        let node = doc
            .element_by_id(id)
            .ok_or_else(|| format!("no element with id `{id}`"))?;
        return Ok(if cli.children {
            Scope::Children(node)
        } else {
            Scope::Node(node)
        });
    }
    match (&cli.start, &cli.end) {
        (Some(start), Some(end)) => Ok(Scope::Range(Range::new(
            resolve_endpoint(doc, start)?,
            resolve_endpoint(doc, end)?,
        ))),
        _ => Ok(Scope::Document),
    }
}

fn resolve_endpoint(doc: &Document, endpoint: &Endpoint) -> Result<Boundary, String> {
    let element = doc
        .element_by_id(&endpoint.id)
        .ok_or_else(|| format!("no element with id `{}`", endpoint.id))?;
    let container = match endpoint.child {
        Some(index) => doc
            .children(element)
            .nth(index)
            .ok_or_else(|| format!("`{}` has no child {index}", endpoint.id))?,
        None => element,
    };
    Ok(Boundary::new(container, endpoint.offset))
}

/// The selection a scope covers, for the clipboard encoder.
fn scope_selection(doc: &Document, scope: Scope) -> Selection {
    let range = match scope {
        Scope::Document => doc
            .root_element()
            .map_or_else(|| Range::select_node_contents(doc, doc.root()), |root| {
                Range::select_node_contents(doc, root)
            }),
        Scope::Node(node) => {
            Range::select_node(doc, node).unwrap_or_else(|| Range::select_node_contents(doc, node))
        }
        Scope::Children(node) => Range::select_node_contents(doc, node),
        Scope::Range(range) => range,
    };
    Selection::from(range)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn flags(cli: &Cli) -> EncoderFlags {
    let mut flags = EncoderFlags::empty();
    flags.set(EncoderFlags::SKIP_INVISIBLE_CONTENT, cli.skip_invisible);
    flags.set(EncoderFlags::OUTPUT_PREFORMATTED, cli.preformatted);
    flags.set(EncoderFlags::OUTPUT_DROP_INVISIBLE_BREAK, cli.drop_invisible_breaks);
    flags.set(EncoderFlags::OUTPUT_ABSOLUTE_LINKS, cli.absolute_links);
    flags.set(EncoderFlags::ALLOW_CROSS_SHADOW_BOUNDARY, cli.cross_shadow);
    flags.set(EncoderFlags::OUTPUT_WRAP, cli.wrap.is_some());
    flags
}

fn encode(cli: &Cli, doc: &Document, scope: Scope) -> Result<(), EncodeError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.copy {
        let mut encoder = CopyEncoder::new();
        encoder.init(doc, &cli.mime, flags(cli));
        if let Some(ref label) = cli.encoding {
            encoder.set_charset(label)?;
        }
        if let Some(column) = cli.wrap {
            encoder.set_wrap_column(column);
        }
        encoder.set_selection(&scope_selection(doc, scope))?;
        if cli.context {
            return print_context(&mut out, &encoder.encode_with_context()?);
        }
        if let Some(max) = cli.max_length {
            return print_text(&mut out, &encoder.encode_with_max_length(max)?);
        }
        return encoder.encode_to_stream(&mut out);
    }

    let mut encoder = DocumentEncoder::new();
    encoder.init(doc, &cli.mime, flags(cli));
    if let Some(ref label) = cli.encoding {
        encoder.set_charset(label)?;
    }
    if let Some(column) = cli.wrap {
        encoder.set_wrap_column(column);
    }
    match scope {
        Scope::Document => {}
        Scope::Node(node) => encoder.set_node(node),
        Scope::Children(node) => encoder.set_container_node(node),
        Scope::Range(range) => encoder.set_range(range),
    }
    if cli.context {
        return print_context(&mut out, &encoder.encode_with_context()?);
    }
    if let Some(max) = cli.max_length {
        return print_text(&mut out, &encoder.encode_with_max_length(max)?);
    }
    encoder.encode_to_stream(&mut out)
}

fn print_text(out: &mut dyn Write, text: &str) -> Result<(), EncodeError> {
    writeln!(out, "{text}")?;
    Ok(())
}

fn print_context(out: &mut dyn Write, encoded: &EncodedContext) -> Result<(), EncodeError> {
    writeln!(out, "context: {}", encoded.context)?;
    writeln!(out, "info: {}", encoded.info)?;
    writeln!(out, "fragment: {}", encoded.fragment)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parsing() {
        assert_eq!(
            "p:2".parse::<Endpoint>(),
            Ok(Endpoint {
                id: "p".to_string(),
                child: None,
                offset: 2
            })
        );
        assert_eq!(
            "b/0:5".parse::<Endpoint>(),
            Ok(Endpoint {
                id: "b".to_string(),
                child: Some(0),
                offset: 5
            })
        );
        assert!("p".parse::<Endpoint>().is_err());
        assert!(":3".parse::<Endpoint>().is_err());
        assert!("p/x:3".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
