use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use spindle_compiler::{CompileError, ProgramCompiler};
use spindle_core::{ContainerError, Library, NodeCollision, Program};
use spindle_err::{ErrorCtx, Level};
use spindle_sourcemap::{LineMap, Span};
use spindle_syn::ast;
use spindle_syn::parse::Parse;
use spindle_syn::refine;

/// The source container formats the loader understands.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SourceFormat {
    /// `.yarn.txt`: header lines, `---`, body, `===` per node.
    Text,
    /// `.json`: an array of node records.
    Json,
    /// `.node`: a bare body, loaded as a single node titled `Start`.
    SingleNode,
}

impl SourceFormat {
    /// Picks a format from a file suffix, if it is a known one.
    pub fn for_path(path: &Path) -> Option<SourceFormat> {
        let name = path.file_name()?.to_str()?;

        if name.ends_with(".yarn.txt") || name.ends_with(".txt") || name.ends_with(".yarn") {
            Some(SourceFormat::Text)
        } else if name.ends_with(".json") {
            Some(SourceFormat::Json)
        } else if name.ends_with(".node") {
            Some(SourceFormat::SingleNode)
        } else {
            None
        }
    }

    /// Guesses the format from the content: JSON documents start with a
    /// bracket, text documents contain a `---` header terminator.
    pub fn sniff(source: &str) -> SourceFormat {
        let trimmed = source.trim_start();

        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            SourceFormat::Json
        } else if source.lines().any(|line| line.trim_end() == "---") {
            SourceFormat::Text
        } else {
            SourceFormat::SingleNode
        }
    }
}

/// Errors produced while turning a source document into a program.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot determine the source format of `{file}`")]
    UnknownFormat { file: String },
    #[error("failed to read `{file}`: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in `{file}`: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("errors in `{file}`:\n{rendered}")]
    Parse { file: String, rendered: String },
    #[error("failed to compile `{file}`: {source}")]
    Compile {
        file: String,
        #[source]
        source: CompileError,
    },
    #[error(transparent)]
    Collision(#[from] NodeCollision),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// A node record of the JSON container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub title: String,
    /// Space-separated tags, as authored.
    #[serde(default)]
    pub tags: String,
    pub body: NodeBody,
    #[serde(rename = "colorID", default)]
    pub color_id: i32,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Node bodies appear both as a single string and as an array of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeBody {
    Text(String),
    Lines(Vec<String>),
}

impl NodeBody {
    fn text(&self) -> String {
        match self {
            NodeBody::Text(text) => text.clone(),
            NodeBody::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Loads a source document into a program.
pub fn load_string(
    source: &str,
    file_name: &str,
    format: SourceFormat,
    library: &Library,
) -> Result<Program, LoadError> {
    match format {
        SourceFormat::Text => load_text(source, file_name, library),
        SourceFormat::Json => load_json(source, file_name, library),
        SourceFormat::SingleNode => load_single_node(source, file_name, library),
    }
}

/// Loads a file, picking the format from its suffix or, failing that, from
/// its content.
pub fn load_path(path: &Path, library: &Library) -> Result<Program, LoadError> {
    let file = path.display().to_string();

    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        file: file.clone(),
        source,
    })?;

    let format = SourceFormat::for_path(path).unwrap_or_else(|| SourceFormat::sniff(&source));

    load_string(&source, &file, format, library)
}

fn load_text(source: &str, file_name: &str, library: &Library) -> Result<Program, LoadError> {
    let mut file = ast::File::parse(source, 0)
        .map_err(|errors| parse_error(file_name, source, 0, &errors))?;

    let refine_errors = ErrorCtx::new();
    refine::refine(&refine_errors, &mut file);
    check_refine_errors(refine_errors, file_name, source, 0)?;

    for node in &file.nodes {
        warn_custom_headers(node, file_name);
    }

    let mut compiler = ProgramCompiler::new(library);
    compiler
        .add_file(&file, source, 0)
        .map_err(|source| LoadError::Compile {
            file: file_name.to_string(),
            source,
        })?;

    Ok(compiler.finish())
}

fn load_json(source: &str, file_name: &str, library: &Library) -> Result<Program, LoadError> {
    let records: Vec<NodeInfo> =
        serde_json::from_str(source).map_err(|source| LoadError::Json {
            file: file_name.to_string(),
            source,
        })?;

    let mut compiler = ProgramCompiler::new(library);

    for record in &records {
        let body = record.body.text();
        let node = node_from_record(record, &body, file_name)?;

        compiler
            .add_node(&node, &body, 0)
            .map_err(|source| LoadError::Compile {
                file: file_name.to_string(),
                source,
            })?;
    }

    Ok(compiler.finish())
}

fn load_single_node(
    source: &str,
    file_name: &str,
    library: &Library,
) -> Result<Program, LoadError> {
    let body = parse_body(source, file_name)?;

    let node = ast::Node {
        span: body.span,
        headers: vec![ast::NodeHeader::Title("Start".to_string(), Span::nil())],
        body,
        raw_body: None,
    };

    let mut compiler = ProgramCompiler::new(library);
    compiler
        .add_node(&node, source, 0)
        .map_err(|source| LoadError::Compile {
            file: file_name.to_string(),
            source,
        })?;

    Ok(compiler.finish())
}

/// Builds an AST node from a JSON record, parsing the body unless the record
/// is tagged `rawText`.
fn node_from_record(
    record: &NodeInfo,
    body_source: &str,
    file_name: &str,
) -> Result<ast::Node, LoadError> {
    let tags: Vec<String> = record.tags.split_whitespace().map(String::from).collect();
    let is_raw_text = tags.iter().any(|tag| tag == "rawText");

    let mut headers = vec![ast::NodeHeader::Title(record.title.clone(), Span::nil())];
    if !tags.is_empty() {
        headers.push(ast::NodeHeader::Tags(tags, Span::nil()));
    }
    if record.color_id != 0 {
        headers.push(ast::NodeHeader::ColorId(record.color_id, Span::nil()));
    }
    if let Some(position) = record.position {
        headers.push(ast::NodeHeader::Position(position.x, position.y, Span::nil()));
    }

    let (body, raw_body) = if is_raw_text {
        let span = if body_source.is_empty() {
            None
        } else {
            Some(Span::new(0, body_source.len() as u32))
        };
        (ast::Block::empty(Span::nil()), span)
    } else {
        let context = format!("{} (node `{}`)", file_name, record.title);
        (parse_body(body_source, &context)?, None)
    };

    Ok(ast::Node {
        span: body.span,
        headers,
        body,
        raw_body,
    })
}

fn parse_body(source: &str, file_name: &str) -> Result<ast::Block, LoadError> {
    let mut body = ast::Block::parse(source, 0)
        .map_err(|errors| parse_error(file_name, source, 0, &errors))?;

    let refine_errors = ErrorCtx::new();
    refine::refine(&refine_errors, &mut body);
    check_refine_errors(refine_errors, file_name, source, 0)?;

    Ok(body)
}

fn warn_custom_headers(node: &ast::Node, file_name: &str) {
    for header in &node.headers {
        if let ast::NodeHeader::Custom(key, _, _) = header {
            warn!(
                file = %file_name,
                node = node.title().unwrap_or("<untitled>"),
                header = %key,
                "skipping unknown header field"
            );
        }
    }
}

fn check_refine_errors(
    errors: ErrorCtx,
    file_name: &str,
    source: &str,
    span_base: u32,
) -> Result<(), LoadError> {
    let errors = errors
        .into_vec()
        .into_iter()
        .map(spindle_err::ErrorBuilder::done)
        .collect::<Vec<_>>();

    if errors.iter().any(|error| error.level() >= Level::Error) {
        Err(parse_error(file_name, source, span_base, &errors))
    } else {
        Ok(())
    }
}

/// Renders parse diagnostics into a `line:column: level: message` listing.
fn parse_error(
    file_name: &str,
    source: &str,
    span_base: u32,
    errors: &[spindle_err::Error],
) -> LoadError {
    let line_map = LineMap::new(source, span_base);

    let rendered = errors
        .iter()
        .map(|error| match error.span() {
            Some(span) => format!(
                "{}: {}: {}",
                line_map.span_location(span),
                error.level(),
                error.message()
            ),
            None => format!("{}: {}", error.level(), error.message()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    LoadError::Parse {
        file: file_name.to_string(),
        rendered,
    }
}
