//! Local code lookup over a project root: search, symbols, callers,
//! callees, ranged reads and keyword recall over a memory file.

use async_trait::async_trait;
use council_application::ports::lookup_backend::{BackendError, LookupBackend};
use glob::Pattern;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(feature = "web-tools")]
use super::web::DuckDuckGoSearch;

/// Files larger than this are never searched or read (2 MB)
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Upper bound on files scanned per lookup
const MAX_FILES: usize = 20_000;

/// Directories that never hold interesting source
const SKIP_DIRS: [&str; 4] = ["target", "node_modules", "dist", "build"];

/// Call-like tokens that are control flow, not calls
const NOT_CALLS: [&str; 9] = [
    "if", "while", "for", "match", "return", "switch", "catch", "loop", "elif",
];

const SYMBOL_PATTERN: &str = concat!(
    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:export\s+)?(?:default\s+)?",
    r"(?:async\s+)?(?:unsafe\s+)?(?:const\s+)?",
    r"(fn|struct|enum|trait|type|mod|class|def|function|interface|func)\s+",
    r"([A-Za-z_][A-Za-z0-9_]*)",
);

const CALL_PATTERN: &str = r"([A-Za-z_][A-Za-z0-9_]*(?:(?:::|\.)[A-Za-z_][A-Za-z0-9_]*)*)\s*\(";

/// Lookup backend over a local checkout
pub struct LocalCodeBackend {
    index: CodeIndex,
    memory_file: Option<PathBuf>,
    #[cfg(feature = "web-tools")]
    web: Option<DuckDuckGoSearch>,
}

impl LocalCodeBackend {
    /// Serve lookups from `root`, which must be an existing directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            BackendError::NotFound(format!("project root {}: {}", root.display(), e))
        })?;
        if !root.is_dir() {
            let message = format!("{} is not a directory", root.display());
            return Err(BackendError::InvalidInput(message));
        }
        Ok(Self {
            index: CodeIndex { root },
            memory_file: None,
            #[cfg(feature = "web-tools")]
            web: None,
        })
    }

    pub fn with_memory_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.memory_file = Some(path.into());
        self
    }

    #[cfg(feature = "web-tools")]
    pub fn with_web_search(mut self, web: DuckDuckGoSearch) -> Self {
        self.web = Some(web);
        self
    }

    pub fn root(&self) -> &Path {
        &self.index.root
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(CodeIndex) -> Result<T, BackendError> + Send + 'static,
    {
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || f(index))
            .await
            .map_err(|e| BackendError::Unavailable(format!("lookup task failed: {}", e)))?
    }
}

#[async_trait]
impl LookupBackend for LocalCodeBackend {
    async fn search_code(
        &self,
        query: &str,
        path: Option<&str>,
        limit: usize,
    ) -> Result<String, BackendError> {
        let (query, path) = (query.to_string(), path.map(str::to_string));
        self.blocking(move |index| index.search(&query, path.as_deref(), limit)).await
    }

    async fn symbols(&self, file_path: &str) -> Result<String, BackendError> {
        let file_path = file_path.to_string();
        self.blocking(move |index| index.symbols(&file_path)).await
    }

    async fn read_file(
        &self,
        file_path: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
    ) -> Result<String, BackendError> {
        let file_path = file_path.to_string();
        self.blocking(move |index| index.read_lines(&file_path, start_line, end_line)).await
    }

    async fn callers(&self, function_name: &str, limit: usize) -> Result<String, BackendError> {
        let name = function_name.to_string();
        self.blocking(move |index| index.callers(&name, limit)).await
    }

    async fn callees(&self, function_name: &str, limit: usize) -> Result<String, BackendError> {
        let name = function_name.to_string();
        self.blocking(move |index| index.callees(&name, limit)).await
    }

    async fn recall(&self, query: &str, limit: usize) -> Result<String, BackendError> {
        let Some(memory_file) = self.memory_file.clone() else {
            return Err(BackendError::Unavailable("no memory file configured".to_string()));
        };
        let query = query.to_string();
        self.blocking(move |_| recall_from(&memory_file, &query, limit)).await
    }

    async fn web_query(&self, query: &str, limit: usize) -> Result<String, BackendError> {
        #[cfg(feature = "web-tools")]
        if let Some(web) = &self.web {
            return web.query(query, limit).await;
        }
        let _ = (query, limit);
        Err(BackendError::Unsupported("web search is not enabled".to_string()))
    }
}

/// Synchronous lookups rooted at a canonical directory
#[derive(Debug, Clone)]
struct CodeIndex {
    root: PathBuf,
}

impl CodeIndex {
    /// Resolve a caller-supplied path, refusing anything outside the root
    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let candidate = self.root.join(path.trim());
        let resolved = candidate
            .canonicalize()
            .map_err(|_| BackendError::NotFound(path.to_string()))?;
        if !resolved.starts_with(&self.root) {
            let message = format!("{} is outside the project root", path);
            return Err(BackendError::PermissionDenied(message));
        }
        Ok(resolved)
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root).unwrap_or(path).display().to_string()
    }

    fn source_files(&self, dir: &Path) -> Vec<PathBuf> {
        if dir.is_file() {
            return vec![dir.to_path_buf()];
        }
        let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
        let Ok(paths) = glob::glob(&pattern) else {
            return Vec::new();
        };
        paths
            .flatten()
            .filter(|p| !self.is_skipped(p))
            .filter(|p| fs::metadata(p).is_ok_and(|m| m.is_file() && m.len() <= MAX_FILE_SIZE))
            .take(MAX_FILES)
            .collect()
    }

    fn is_skipped(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
        })
    }

    /// Every line matching `regex`, as `path:line: text`
    fn grep(
        &self,
        dir: &Path,
        regex: &Regex,
        limit: usize,
        skip: impl Fn(&str) -> bool,
    ) -> (Vec<String>, bool) {
        let mut hits = Vec::new();
        for file in self.source_files(dir) {
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            for (number, line) in content.lines().enumerate() {
                if !regex.is_match(line) || skip(line) {
                    continue;
                }
                if hits.len() == limit {
                    return (hits, true);
                }
                hits.push(format!("{}:{}: {}", self.display(&file), number + 1, line.trim()));
            }
        }
        (hits, false)
    }

    fn search(
        &self,
        query: &str,
        path: Option<&str>,
        limit: usize,
    ) -> Result<String, BackendError> {
        if query.trim().is_empty() {
            return Err(BackendError::InvalidInput("empty search query".to_string()));
        }
        // not a valid regex: search for the text literally
        let regex = Regex::new(query)
            .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(query))))
            .map_err(|e| BackendError::InvalidInput(e.to_string()))?;
        let dir = match path {
            Some(p) => self.resolve(p)?,
            None => self.root.clone(),
        };
        debug!("search_code `{}` under {}", query, dir.display());

        let (hits, limited) = self.grep(&dir, &regex, limit, |_| false);
        Ok(render_hits(hits, limited, limit, || format!("No matches for `{}`", query)))
    }

    fn symbols(&self, file_path: &str) -> Result<String, BackendError> {
        let path = self.resolve(file_path)?;
        let content = read_text(&path)?;
        let regex =
            Regex::new(SYMBOL_PATTERN).map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let symbols: Vec<String> = content
            .lines()
            .enumerate()
            .filter_map(|(number, line)| {
                let caps = regex.captures(line)?;
                Some(format!("{}: {} {}", number + 1, &caps[1], &caps[2]))
            })
            .collect();

        if symbols.is_empty() {
            return Ok(format!("No symbols found in {}", self.display(&path)));
        }
        Ok(format!("Symbols in {}:\n{}", self.display(&path), symbols.join("\n")))
    }

    fn read_lines(
        &self,
        file_path: &str,
        start: Option<usize>,
        end: Option<usize>,
    ) -> Result<String, BackendError> {
        let path = self.resolve(file_path)?;
        if !path.is_file() {
            return Err(BackendError::InvalidInput(format!("{} is not a file", file_path)));
        }
        let content = read_text(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Ok(String::new());
        }

        let start = start.unwrap_or(1).max(1);
        let end = end.unwrap_or(lines.len()).min(lines.len());
        if start > end {
            return Err(BackendError::InvalidInput(format!(
                "line range {}-{} is outside {} ({} lines)",
                start,
                end,
                file_path,
                lines.len()
            )));
        }

        Ok(lines[start - 1..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>5}: {}", start + i, line))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn callers(&self, name: &str, limit: usize) -> Result<String, BackendError> {
        let name = identifier(name)?;
        let call = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name)))
            .map_err(|e| BackendError::InvalidInput(e.to_string()))?;
        let definition = definition_regex(name)?;

        let (hits, limited) = self.grep(&self.root, &call, limit, |line| definition.is_match(line));
        Ok(render_hits(hits, limited, limit, || format!("No callers of `{}` found", name)))
    }

    fn callees(&self, name: &str, limit: usize) -> Result<String, BackendError> {
        let name = identifier(name)?;
        let definition = definition_regex(name)?;
        let call = Regex::new(CALL_PATTERN).map_err(|e| BackendError::Unavailable(e.to_string()))?;

        for file in self.source_files(&self.root) {
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            let lines: Vec<&str> = content.lines().collect();
            let Some(at) = lines.iter().position(|line| definition.is_match(line)) else {
                continue;
            };

            let mut called: Vec<String> = Vec::new();
            for line in function_body(&lines, at) {
                for caps in call.captures_iter(line) {
                    let target = caps[1].trim_start_matches("self.").to_string();
                    if target == name
                        || NOT_CALLS.contains(&target.as_str())
                        || called.contains(&target)
                    {
                        continue;
                    }
                    called.push(target);
                }
            }
            called.truncate(limit);

            let location = format!("{}:{}", self.display(&file), at + 1);
            if called.is_empty() {
                return Ok(format!("`{}` ({}) calls no functions", name, location));
            }
            let list: Vec<String> = called.iter().map(|c| format!("- {}", c)).collect();
            return Ok(format!(
                "Functions called by `{}` ({}):\n{}",
                name,
                location,
                list.join("\n")
            ));
        }

        Err(BackendError::NotFound(format!("function `{}`", name)))
    }
}

fn read_text(path: &Path) -> Result<String, BackendError> {
    let metadata = fs::metadata(path).map_err(|e| BackendError::Io(e.to_string()))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(BackendError::InvalidInput(format!(
            "file too large ({} bytes, max {})",
            metadata.len(),
            MAX_FILE_SIZE
        )));
    }
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(path.display().to_string())
        }
        _ => BackendError::Io(e.to_string()),
    })
}

fn identifier(name: &str) -> Result<&str, BackendError> {
    let name = name.trim();
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(BackendError::InvalidInput(format!("`{}` is not a function name", name)))
    }
}

fn definition_regex(name: &str) -> Result<Regex, BackendError> {
    Regex::new(&format!(r"\b(?:fn|def|function|func)\s+{}\b", regex::escape(name)))
        .map_err(|e| BackendError::InvalidInput(e.to_string()))
}

/// Lines of the function defined at `at`.
///
/// Brace languages end where the braces balance; a definition line ending in
/// `:` is indentation-delimited.
fn function_body<'a>(lines: &[&'a str], at: usize) -> Vec<&'a str> {
    let header = lines[at];
    if header.trim_end().ends_with(':') {
        let indent = indentation(header);
        return lines[at + 1..]
            .iter()
            .take_while(|line| line.trim().is_empty() || indentation(line) > indent)
            .copied()
            .collect();
    }

    let mut body = Vec::new();
    let mut depth = 0i32;
    let mut opened = false;
    for (offset, line) in lines[at..].iter().enumerate() {
        let text = match (offset, line.find('{')) {
            (0, Some(brace)) => &line[brace..],
            (0, None) => "",
            _ => line,
        };
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        body.push(text);
        if opened && depth <= 0 {
            break;
        }
    }
    body
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn render_hits(
    hits: Vec<String>,
    limited: bool,
    limit: usize,
    empty: impl FnOnce() -> String,
) -> String {
    if hits.is_empty() {
        return empty();
    }
    let mut output = hits.join("\n");
    if limited {
        output.push_str(&format!("\n... (limited to {} matches)", limit));
    }
    output
}

/// Memory entries are blank-line separated paragraphs, ranked by how many
/// query terms they mention
fn recall_from(memory_file: &Path, query: &str, limit: usize) -> Result<String, BackendError> {
    let content = match fs::read_to_string(memory_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(BackendError::Io(e.to_string())),
    };

    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() >= 2)
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return Err(BackendError::InvalidInput("empty recall query".to_string()));
    }

    let mut scored: Vec<(usize, &str)> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let lower = entry.to_lowercase();
            let score = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (score > 0).then_some((score, entry))
        })
        .collect();
    // stable: equally relevant memories keep file order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    if scored.is_empty() {
        return Ok(format!("No memories match `{}`", query));
    }
    Ok(scored
        .into_iter()
        .take(limit)
        .map(|(_, entry)| entry)
        .collect::<Vec<_>>()
        .join("\n---\n"))
}
