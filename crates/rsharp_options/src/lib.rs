//! rsharp_options: compiler options and the `rsharp.json` project file.
//!
//! A project file names its sources, its options and the other projects
//! it references. Relative paths are taken from the project's directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up when a project path names a directory.
pub const PROJECT_FILE_NAME: &str = "rsharp.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Preprocessor symbols defined for every file.
    pub defines: Vec<String>,
    /// Assembly manifest paths.
    pub references: Vec<String>,
    /// Leave out the built-in core library scope.
    pub no_std_lib: bool,
    pub warnings_as_errors: bool,
    /// Validate the span invariant of every tree after parsing.
    pub check_spans: bool,
}

impl CompilerOptions {
    /// Add the symbols of one `-d` value; `A;B` and `A,B` both name two.
    pub fn add_defines(&mut self, value: &str) {
        for symbol in value.split([';', ',']).map(str::trim).filter(|s| !s.is_empty()) {
            if !self.defines.iter().any(|d| d == symbol) {
                self.defines.push(symbol.to_string());
            }
        }
    }

    /// Overlay command-line options on file options. Lists are appended,
    /// switches set on either side stay set.
    pub fn merge(&mut self, overrides: &CompilerOptions) {
        for define in &overrides.defines {
            self.add_defines(define);
        }
        for reference in &overrides.references {
            if !self.references.contains(reference) {
                self.references.push(reference.clone());
            }
        }
        self.no_std_lib |= overrides.no_std_lib;
        self.warnings_as_errors |= overrides.warnings_as_errors;
        self.check_spans |= overrides.check_spans;
    }
}

/// The `rsharp.json` file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub compiler_options: CompilerOptions,
    pub files: Vec<String>,
    /// Directories (or project files) of referenced projects.
    pub references: Vec<String>,
    /// Directory the relative paths above are taken from.
    #[serde(skip)]
    pub directory: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read project file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project '{0}' references itself through its project references")]
    CircularReference(PathBuf),
}

/// Parse a project file from a string.
pub fn parse_project(content: &str) -> Result<ProjectConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// The project file a `-p` argument names: the path itself, or
/// `rsharp.json` inside it when it is a directory.
pub fn project_file_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(PROJECT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

impl ProjectConfig {
    /// Read and parse the project file at `path` (file or directory).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = project_file_path(path);
        let content = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
            path: file.clone(),
            source,
        })?;
        let mut config = parse_project(&content).map_err(|source| ConfigError::Json {
            path: file.clone(),
            source,
        })?;
        config.directory = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.directory.join(relative)
    }

    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| self.resolve(f)).collect()
    }

    pub fn manifest_paths(&self) -> Vec<PathBuf> {
        self.compiler_options.references.iter().map(|r| self.resolve(r)).collect()
    }

    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.references.iter().map(|r| self.resolve(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_project() {
        let config = parse_project(
            r#"{
                "compilerOptions": {
                    "defines": ["DEBUG", "TRACE"],
                    "references": ["libs/acme.json"],
                    "noStdLib": true,
                    "warningsAsErrors": true
                },
                "files": ["src/Program.cs"],
                "references": ["../shared"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.compiler_options.defines, vec!["DEBUG", "TRACE"]);
        assert!(config.compiler_options.no_std_lib);
        assert!(config.compiler_options.warnings_as_errors);
        assert!(!config.compiler_options.check_spans);
        assert_eq!(config.files, vec!["src/Program.cs"]);
        assert_eq!(config.references, vec!["../shared"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let config = parse_project("{}").unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_unknown_json_is_an_error() {
        assert!(parse_project(r#"{ "files": "not a list" }"#).is_err());
    }

    #[test]
    fn test_add_defines_splits_lists() {
        let mut options = CompilerOptions::default();
        options.add_defines("A;B");
        options.add_defines("B, C");
        assert_eq!(options.defines, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_command_line_overrides_merge() {
        let mut options = CompilerOptions {
            defines: vec!["DEBUG".into()],
            references: vec!["a.json".into()],
            ..Default::default()
        };
        let overrides = CompilerOptions {
            defines: vec!["TRACE".into()],
            references: vec!["a.json".into(), "b.json".into()],
            warnings_as_errors: true,
            ..Default::default()
        };
        options.merge(&overrides);
        assert_eq!(options.defines, vec!["DEBUG", "TRACE"]);
        assert_eq!(options.references, vec!["a.json", "b.json"]);
        assert!(options.warnings_as_errors);
        assert!(!options.no_std_lib);
    }

    #[test]
    fn test_paths_are_relative_to_project_directory() {
        let mut config = parse_project(r#"{ "files": ["a.cs"], "references": ["../lib"] }"#).unwrap();
        config.directory = PathBuf::from("/work/app");
        assert_eq!(config.source_paths(), vec![PathBuf::from("/work/app/a.cs")]);
        assert_eq!(config.reference_paths(), vec![PathBuf::from("/work/app/../lib")]);
    }

    #[test]
    fn test_load_missing_file() {
        let error = ProjectConfig::load(Path::new("/nonexistent/rsharp.json")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
