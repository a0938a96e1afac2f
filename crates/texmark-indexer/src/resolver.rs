//! Project file-set resolution.
//!
//! A project is its root file plus every file the root includes directly.
//! Includes of included files are not followed.

use crate::config::IndexerConfig;
use crate::scanner::is_commented;
use crate::source::ContentSource;
use crate::IndexerError;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Extracts include directives from a root file.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    pattern: Regex,
    default_extension: String,
}

impl IncludeResolver {
    /// Build a resolver for the given include commands (without backslash).
    pub fn new(commands: &[String], default_extension: &str) -> Result<Self, IndexerError> {
        if commands.is_empty() {
            return Err(IndexerError::Pattern(
                "at least one include command is required".to_string(),
            ));
        }
        let alternatives = commands
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\\(?:{alternatives})\s*\{{([^}}]*)\}}"))?;

        Ok(Self {
            pattern,
            default_extension: default_extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self, IndexerError> {
        Self::new(&config.include_commands, &config.default_extension)
    }

    /// Include targets in `text`, in order of appearance, as written.
    pub fn targets<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if is_commented(text, whole.start()) {
                    return None;
                }
                let target = caps.get(1)?.as_str().trim();
                (!target.is_empty()).then_some(target)
            })
            .collect()
    }

    /// Ordered, de-duplicated project files: the root first, then each
    /// existing include target in discovery order.
    pub fn resolve<S: ContentSource + ?Sized>(&self, source: &S, root: &Path) -> Vec<PathBuf> {
        let root = normalize_path(root);
        let mut files = vec![root.clone()];
        let mut seen: HashSet<PathBuf> = HashSet::from([root.clone()]);

        let text = match source.read_content(&root) {
            Ok((text, _)) => text,
            Err(e) => {
                warn!(path = ?root, error = %e, "Failed to read root file");
                return files;
            }
        };

        let base = root.parent().unwrap_or_else(|| Path::new(""));
        for target in self.targets(&text) {
            let path = self.target_path(base, target);
            if !source.file_exists(&path) {
                debug!(path = ?path, "Skipping missing include target");
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }

        debug!(root = ?root, files = files.len(), "Resolved project files");
        files
    }

    fn target_path(&self, base: &Path, target: &str) -> PathBuf {
        let mut path = PathBuf::from(target);
        if path.extension().is_none() && !self.default_extension.is_empty() {
            path.set_extension(&self.default_extension);
        }
        normalize_path(&base.join(path))
    }
}

/// Lexically normalize a path, dropping `.` and folding `..`.
///
/// Does not touch the filesystem, so it works for files that do not exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn resolver() -> IncludeResolver {
        IncludeResolver::from_config(&IndexerConfig::default()).unwrap()
    }

    #[test]
    fn test_targets_in_order() {
        let text = "\\input{intro}\n\\include{chapters/body.tex}\n\\subfile{ appendix }\n";
        assert_eq!(
            resolver().targets(text),
            vec!["intro", "chapters/body.tex", "appendix"]
        );
    }

    #[test]
    fn test_targets_skip_comments_and_lookalikes() {
        let text = "% \\input{old}\n\\includegraphics{fig}\ntext 50\\% \\input{kept}\n\\input{}\n";
        assert_eq!(resolver().targets(text), vec!["kept"]);
    }

    #[test]
    fn test_resolve_adds_extension_and_skips_missing() {
        let mut source = MemorySource::new();
        source.write(
            "/doc/main.tex",
            "\\input{intro}\n\\input{missing}\n\\input{sub/part.tex}\n",
        );
        source.write("/doc/intro.tex", "");
        source.write("/doc/sub/part.tex", "");

        let files = resolver().resolve(&source, Path::new("/doc/main.tex"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/doc/main.tex"),
                PathBuf::from("/doc/intro.tex"),
                PathBuf::from("/doc/sub/part.tex"),
            ]
        );
    }

    #[test]
    fn test_resolve_deduplicates() {
        let mut source = MemorySource::new();
        source.write(
            "/doc/main.tex",
            "\\input{a}\n\\input{./a.tex}\n\\input{main}\n\\include{b}\n\\input{a}\n",
        );
        source.write("/doc/a.tex", "");
        source.write("/doc/b.tex", "");

        let files = resolver().resolve(&source, Path::new("/doc/main.tex"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/doc/main.tex"),
                PathBuf::from("/doc/a.tex"),
                PathBuf::from("/doc/b.tex"),
            ]
        );
    }

    #[test]
    fn test_resolve_is_one_level() {
        let mut source = MemorySource::new();
        source.write("/doc/main.tex", "\\input{a}\n");
        source.write("/doc/a.tex", "\\input{b}\n");
        source.write("/doc/b.tex", "");

        let files = resolver().resolve(&source, Path::new("/doc/main.tex"));
        assert_eq!(
            files,
            vec![PathBuf::from("/doc/main.tex"), PathBuf::from("/doc/a.tex")]
        );
    }

    #[test]
    fn test_resolve_unreadable_root() {
        let source = MemorySource::new();
        let files = resolver().resolve(&source, Path::new("/doc/main.tex"));
        assert_eq!(files, vec![PathBuf::from("/doc/main.tex")]);
    }

    #[test]
    fn test_resolve_uses_modified_buffer() {
        let mut source = MemorySource::new();
        let root = PathBuf::from("/doc/main.tex");
        source.write(&root, "");
        source.write("/doc/a.tex", "");
        source.open_buffer(&root);
        source.buffers_mut().edit(&root, "\\input{a}");

        let files = resolver().resolve(&source, &root);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_custom_commands_and_extension() {
        let resolver = IncludeResolver::new(&["import".to_string()], ".ltx").unwrap();
        let mut source = MemorySource::new();
        source.write("/doc/main.ltx", "\\import{a}\n\\input{b}\n");
        source.write("/doc/a.ltx", "");
        source.write("/doc/b.ltx", "");

        let files = resolver.resolve(&source, Path::new("/doc/main.ltx"));
        assert_eq!(
            files,
            vec![PathBuf::from("/doc/main.ltx"), PathBuf::from("/doc/a.ltx")]
        );
    }

    #[test]
    fn test_no_commands_is_an_error() {
        let result = IncludeResolver::new(&[], "tex");
        assert!(matches!(result, Err(IndexerError::Pattern(_))));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/doc/./sub/../a.tex")),
            PathBuf::from("/doc/a.tex")
        );
        assert_eq!(
            normalize_path(Path::new("../x.tex")),
            PathBuf::from("../x.tex")
        );
    }
}
