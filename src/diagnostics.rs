use crate::{language::errors::SyntaxError, runtime::error::RuntimeError};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: format!("{}: {}", err.kind, err.message),
            label: "here".to_string(),
        }
    }
}

/// Runtime failure rendered against its source. `MissingMain` has no span.
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct RuntimeDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: Option<SourceSpan>,
    #[label("previous definition")]
    previous: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl RuntimeDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &RuntimeError) -> Self {
        Self {
            src,
            span: err.span().map(Into::into),
            previous: err.previous_span().map(Into::into),
            help: err.help(),
            message: format!("{}: {}", err.category(), err),
            label: match err {
                RuntimeError::DuplicateDefinition { .. } => "redefined here".to_string(),
                _ => "here".to_string(),
            },
        }
    }
}

fn named_source(path: &Path, source: &str) -> NamedSource<String> {
    NamedSource::new(path.display().to_string(), source.to_string())
}

pub fn emit_syntax_error(path: &Path, source: &str, err: &SyntaxError) {
    let diagnostic = SyntaxDiagnostic::from_error(named_source(path, source), err);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn emit_runtime_error(path: &Path, source: &str, err: &RuntimeError) {
    let diagnostic = RuntimeDiagnostic::from_error(named_source(path, source), err);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
