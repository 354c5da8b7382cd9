//! rsharp_compiler: Compiler orchestration.
//!
//! A [`Program`] holds the sources and options of one compilation. Files
//! are parsed in parallel; entity building, scope declaration and type
//! resolution then run sequentially over all trees.

use rayon::prelude::*;
use rsharp_core::{CancellationToken, Cancelled};
use rsharp_diagnostics::{messages, Diagnostic, DiagnosticCollection, SharedDiagnostics};
use rsharp_options::{project_file_path, CompilerOptions, ConfigError, ProjectConfig};
use rsharp_parser::{parse_buffer, parse_text, ParseResult};
use rsharp_resolver::{core_library, AssemblyReference, ExternalScope, ReferencedUnit, Resolver};
use rsharp_scanner::{Buffer, ScanError};
use rsharp_semantic::{SemanticBuilder, SemanticGraph};
use rsharp_syntax::SyntaxTree;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Stack size of the parsing threads. Deeply nested sources recurse up to
/// the parser's depth limit.
const PARSE_STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{file}: {source}")]
    Scan {
        file: String,
        #[source]
        source: ScanError,
    },
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start the parser threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("compilation cancelled")]
    Cancelled(#[from] Cancelled),
}

/// Where a source file's bytes come from.
#[derive(Debug, Clone)]
enum SourceInput {
    Text(String),
    Bytes(Vec<u8>),
    /// Opened when parsed, through a windowed buffer.
    Path(PathBuf),
}

#[derive(Debug, Clone)]
struct SourceFile {
    name: String,
    input: SourceInput,
}

/// The result of a compilation.
#[derive(Debug)]
pub struct Compilation {
    /// One tree per successfully read source, in the order added.
    pub trees: Vec<SyntaxTree>,
    pub graph: SemanticGraph,
    /// Sorted by file and position.
    pub diagnostics: DiagnosticCollection,
}

impl Compilation {
    /// True when no error-severity diagnostic was reported.
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// The program represents one compilation: its options, sources and
/// referenced units.
#[derive(Debug)]
pub struct Program {
    pub options: CompilerOptions,
    /// Files read by [`Program::load_root_files`].
    pub root_files: Vec<PathBuf>,
    sources: Vec<SourceFile>,
    references: Vec<Arc<dyn ExternalScope>>,
    /// Diagnostics of referenced projects, reported with this program's.
    inherited: DiagnosticCollection,
    cancellation: Option<CancellationToken>,
}

impl Program {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            root_files: Vec::new(),
            sources: Vec::new(),
            references: Vec::new(),
            inherited: DiagnosticCollection::new(),
            cancellation: None,
        }
    }

    pub fn with_root_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.root_files.extend(files);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Load a project file. Referenced projects are compiled first and
    /// their graphs become referenced units; `overrides` are applied to
    /// this project's options only.
    pub fn from_project(path: &Path, overrides: &CompilerOptions) -> Result<Self, CompileError> {
        let mut visiting = Vec::new();
        Self::load_project(path, overrides, &mut visiting)
    }

    fn load_project(
        path: &Path,
        overrides: &CompilerOptions,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<Self, CompileError> {
        let file = project_file_path(path);
        let key = file.canonicalize().unwrap_or_else(|_| file.clone());
        if visiting.contains(&key) {
            return Err(ConfigError::CircularReference(file).into());
        }
        visiting.push(key);

        let config = ProjectConfig::load(&file)?;
        let mut options = config.compiler_options.clone();
        options.references = config
            .manifest_paths()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        options.merge(overrides);

        let mut program = Program::new(options).with_root_files(config.source_paths());
        for reference in config.reference_paths() {
            let mut referenced = Self::load_project(&reference, &CompilerOptions::default(), visiting)?;
            referenced.load_root_files()?;
            let compilation = referenced.compile()?;
            let name = reference
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!(project = %name, types = compilation.graph.types().count(), "referenced project compiled");
            program.inherited.extend(compilation.diagnostics);
            program.add_reference(Arc::new(ReferencedUnit::new(name, compilation.graph)));
        }
        visiting.pop();
        Ok(program)
    }

    /// Add a source file from text.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.sources.push(SourceFile {
            name: name.into(),
            input: SourceInput::Text(text.into()),
        });
    }

    /// Add a source file from raw bytes; a byte-order mark is honored.
    pub fn add_source_bytes(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.sources.push(SourceFile {
            name: name.into(),
            input: SourceInput::Bytes(bytes.into()),
        });
    }

    pub fn add_reference(&mut self, scope: Arc<dyn ExternalScope>) {
        self.references.push(scope);
    }

    /// Queue every root file. Files are opened when parsed, but a missing
    /// file is reported here.
    pub fn load_root_files(&mut self) -> Result<(), CompileError> {
        for path in &self.root_files {
            std::fs::metadata(path).map_err(|source| CompileError::Io {
                path: path.clone(),
                source,
            })?;
            self.sources.push(SourceFile {
                name: path.to_string_lossy().into_owned(),
                input: SourceInput::Path(path.clone()),
            });
        }
        Ok(())
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn check_cancelled(&self) -> Result<(), Cancelled> {
        match &self.cancellation {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }

    /// Parse one source.
    fn parse(&self, source: &SourceFile) -> Result<ParseResult, CompileError> {
        let defines = self.options.defines.iter().cloned();
        let scan_error = |source_error| CompileError::Scan {
            file: source.name.clone(),
            source: source_error,
        };
        match &source.input {
            SourceInput::Text(text) => parse_text(&source.name, text, defines).map_err(scan_error),
            SourceInput::Bytes(bytes) => {
                parse_buffer(&source.name, Buffer::from_bytes(bytes.clone()), defines).map_err(scan_error)
            }
            SourceInput::Path(path) => {
                let io_error = |error| CompileError::Io {
                    path: path.clone(),
                    source: error,
                };
                let file = File::open(path).map_err(io_error)?;
                let buffer = Buffer::from_seekable(file).map_err(io_error)?;
                parse_buffer(&source.name, buffer, defines).map_err(scan_error)
            }
        }
    }

    /// Parse every source in parallel. A source that cannot be read gets
    /// a diagnostic and no tree.
    fn parse_all(&self, diagnostics: &SharedDiagnostics) -> Result<Vec<SyntaxTree>, CompileError> {
        let pool = rayon::ThreadPoolBuilder::new().stack_size(PARSE_STACK_SIZE).build()?;
        let parsed: Vec<Result<Option<SyntaxTree>, Cancelled>> = pool.install(|| {
            self.sources
                .par_iter()
                .map(|source| {
                    self.check_cancelled()?;
                    match self.parse(source) {
                        Ok(result) => {
                            debug!(file = %source.name, tokens = result.tree.tokens.len(), "file parsed");
                            diagnostics.extend(result.diagnostics);
                            Ok(Some(result.tree))
                        }
                        Err(error) => {
                            let reason = match &error {
                                CompileError::Scan { source, .. } => source.to_string(),
                                CompileError::Io { source, .. } => source.to_string(),
                                other => other.to_string(),
                            };
                            diagnostics.add(Diagnostic::new(
                                &messages::SOURCE_FILE_COULD_NOT_BE_READ,
                                &[&source.name, &reason],
                            ));
                            Ok(None)
                        }
                    }
                })
                .collect()
        });

        let mut trees = Vec::with_capacity(parsed.len());
        for tree in parsed {
            trees.extend(tree?);
        }
        if self.options.check_spans {
            for tree in &trees {
                let broken = tree.check_spans();
                if !broken.is_empty() {
                    warn!(file = %tree.file_name, nodes = broken.len(), "span invariant violated");
                }
            }
        }
        Ok(trees)
    }

    /// The core library (unless `noStdLib`), assembly manifests, then
    /// referenced units. Unreadable manifests are skipped.
    fn external_scopes(&self) -> Vec<Arc<dyn ExternalScope>> {
        let mut scopes: Vec<Arc<dyn ExternalScope>> = Vec::new();
        if !self.options.no_std_lib {
            scopes.push(Arc::new(core_library()));
        }
        for path in &self.options.references {
            match AssemblyReference::load(Path::new(path)) {
                Ok(reference) => scopes.push(Arc::new(reference)),
                Err(error) => warn!(%error, "assembly manifest skipped"),
            }
        }
        scopes.extend(self.references.iter().cloned());
        scopes
    }

    /// Run the full pipeline: parse -> build -> declare -> resolve.
    pub fn compile(&self) -> Result<Compilation, CompileError> {
        let shared = SharedDiagnostics::new();
        let trees = self.parse_all(&shared)?;
        let mut diagnostics = shared.take();
        diagnostics.extend(self.inherited.clone());

        let mut builder = SemanticBuilder::new(&trees);
        if let Some(token) = &self.cancellation {
            builder = builder.with_cancellation(token.clone());
        }
        let output = builder.build()?;
        let mut graph = output.graph;
        diagnostics.extend(output.diagnostics);

        let externals = self.external_scopes();
        let mut resolver = Resolver::new(&trees, &mut graph, &externals);
        if let Some(token) = &self.cancellation {
            resolver = resolver.with_cancellation(token.clone());
        }
        resolver.run()?;
        diagnostics.extend(resolver.into_diagnostics());

        if self.options.warnings_as_errors {
            diagnostics.promote_warnings();
        }
        diagnostics.sort();
        debug!(
            files = trees.len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "compilation finished"
        );
        Ok(Compilation {
            trees,
            graph,
            diagnostics,
        })
    }
}
