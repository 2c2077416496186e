//! Line-oriented source metrics.
//!
//! Each language family has a ruleset; a file's extension selects one from
//! the registry and unknown extensions fall back to a minimal ruleset that
//! only counts control-flow lines.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::FileMetric;

#[derive(Debug)]
pub struct Ruleset {
    pub family: &'static str,
    comment_prefixes: &'static [&'static str],
    class_patterns: Vec<Regex>,
    function_patterns: Vec<Regex>,
    control_flow: Regex,
}

impl Ruleset {
    fn new(
        family: &'static str,
        comment_prefixes: &'static [&'static str],
        class_patterns: &[&str],
        function_patterns: &[&str],
        keywords: &[&str],
    ) -> Self {
        Self {
            family,
            comment_prefixes,
            class_patterns: class_patterns.iter().map(|p| compile(p)).collect(),
            function_patterns: function_patterns.iter().map(|p| compile(p)).collect(),
            control_flow: compile(&format!(r"\b({})\b", keywords.join("|"))),
        }
    }

    pub fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes.iter().any(|p| line.starts_with(p))
    }

    pub fn is_class(&self, line: &str) -> bool {
        self.class_patterns.iter().any(|re| re.is_match(line))
    }

    pub fn is_function(&self, line: &str) -> bool {
        self.function_patterns.iter().any(|re| re.is_match(line))
    }

    pub fn has_control_flow(&self, line: &str) -> bool {
        self.control_flow.is_match(line)
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid ruleset pattern")
}

type Registry = Vec<(&'static [&'static str], Ruleset)>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            (
                &[".rb"][..],
                Ruleset::new(
                    "script",
                    &["#"],
                    &[r"^class\s+\w+"],
                    &[r"^def\s+\w+"],
                    &["if", "unless", "while", "until", "for", "case"],
                ),
            ),
            (
                &[".js", ".ts", ".jsx", ".tsx"][..],
                Ruleset::new(
                    "brace",
                    &["//", "/*"],
                    &[r"^(class|export class)\s+\w+"],
                    &[
                        r"function\s+\w+",
                        r"const\s+\w+\s*=\s*\([^)]*\)\s*=>",
                        r"\w+\s*:\s*function",
                    ],
                    &["if", "for", "while", "switch", "catch"],
                ),
            ),
            (
                &[".py"][..],
                Ruleset::new(
                    "python",
                    &["#"],
                    &[r"^class\s+\w+"],
                    &[r"^def\s+\w+"],
                    &["if", "elif", "for", "while", "try", "except"],
                ),
            ),
            (
                &[".java"][..],
                Ruleset::new(
                    "java",
                    &["//", "/*"],
                    &[r"^(public\s+|private\s+|protected\s+)?class\s+\w+"],
                    &[r"(public\s+|private\s+|protected\s+).*\s+\w+\s*\([^)]*\)\s*\{"],
                    &["if", "for", "while", "switch", "catch"],
                ),
            ),
        ]
    })
}

fn fallback() -> &'static Ruleset {
    static FALLBACK: OnceLock<Ruleset> = OnceLock::new();
    FALLBACK.get_or_init(|| Ruleset::new("generic", &[], &[], &[], &["if", "for", "while"]))
}

/// Lower-cased extension with its leading dot, or `""` when there is none.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub fn ruleset_for(path: &str) -> &'static Ruleset {
    let ext = extension_of(path);
    registry()
        .iter()
        .find(|(extensions, _)| extensions.contains(&ext.as_str()))
        .map(|(_, ruleset)| ruleset)
        .unwrap_or_else(fallback)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetricAnalyzer;

impl FileMetricAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, path: &str, content: &str) -> FileMetric {
        let ruleset = ruleset_for(path);
        let mut metric = FileMetric {
            path: path.to_string(),
            ..Default::default()
        };

        for raw in content.lines() {
            metric.lines += 1;
            let line = raw.trim();

            if ruleset.is_comment(line) {
                metric.comments += 1;
            }
            if ruleset.is_class(line) {
                metric.classes += 1;
            }
            if ruleset.is_function(line) {
                metric.functions += 1;
            }
            if ruleset.has_control_flow(line) {
                metric.complexity += 1;
            }
        }

        metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruby_file() {
        let source = "# A greeter\n\
class Greeter\n\
  def greet(name)\n\
    return 'hi' if name.nil?\n\
    unless name.empty?\n\
      puts name\n\
    end\n\
  end\n\
end\n";
        let metric = FileMetricAnalyzer::new().analyze("lib/greeter.rb", source);

        assert_eq!(metric.lines, 9);
        assert_eq!(metric.comments, 1);
        assert_eq!(metric.classes, 1);
        assert_eq!(metric.functions, 1);
        assert_eq!(metric.complexity, 2);
    }

    #[test]
    fn test_javascript_function_shapes() {
        let source = "// helpers\n\
export class Store {}\n\
function load(id) {\n\
const save = (item) => {\n\
  handler: function() {\n\
  if (a) { for (;;) {} }\n\
}\n";
        let metric = FileMetricAnalyzer::new().analyze("src/store.JS", source);

        assert_eq!(metric.comments, 1);
        assert_eq!(metric.classes, 1);
        assert_eq!(metric.functions, 3);
        // presence per line, not keyword count
        assert_eq!(metric.complexity, 1);
    }

    #[test]
    fn test_python_and_java_rulesets() {
        let python = "class Parser:\n\
    def parse(self):\n\
        try:\n\
            pass\n\
        except ValueError:\n\
            pass\n";
        let metric = FileMetricAnalyzer::new().analyze("parser.py", python);
        assert_eq!(metric.classes, 1);
        assert_eq!(metric.functions, 1);
        assert_eq!(metric.complexity, 2);

        let java = "public class Main {\n\
  public static void main(String[] args) {\n\
    while (true) {}\n\
  }\n\
}\n";
        let metric = FileMetricAnalyzer::new().analyze("Main.java", java);
        assert_eq!(metric.classes, 1);
        assert_eq!(metric.functions, 1);
        assert_eq!(metric.complexity, 1);
    }

    #[test]
    fn test_unknown_extension_uses_fallback() {
        let source = "// not a comment here\nif x {\n  for y in z {}\n}\nmatch v {}\n";
        let metric = FileMetricAnalyzer::new().analyze("src/main.rs", source);

        assert_eq!(ruleset_for("src/main.rs").family, "generic");
        assert_eq!(metric.lines, 5);
        assert_eq!(metric.comments, 0);
        assert_eq!(metric.functions, 0);
        assert_eq!(metric.complexity, 2);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        let metric = FileMetricAnalyzer::new().analyze("a.rb", "verify = format\nwhile_loop = 1\n");
        assert_eq!(metric.complexity, 0);
    }

    #[test]
    fn test_line_count_matches_segments() {
        let analyzer = FileMetricAnalyzer::new();
        for content in ["", "one", "one\n", "one\ntwo", "\n\n\n", "a\r\nb\r\n"] {
            let metric = analyzer.analyze("x.py", content);
            assert_eq!(metric.lines, content.lines().count() as u64, "{:?}", content);
        }
    }

    #[test]
    fn test_control_flow_lines_per_file() {
        let file = |lines: usize, branching: usize| {
            (0..lines)
                .map(|i| if i < branching { "if ready then go end" } else { "x = 1" })
                .collect::<Vec<_>>()
                .join("\n")
        };
        let analyzer = FileMetricAnalyzer::new();

        let counts: Vec<(u64, u64)> = [(100, 2), (50, 1), (20, 0)]
            .iter()
            .map(|(lines, branching)| {
                let m = analyzer.analyze("app.rb", &file(*lines, *branching));
                (m.lines, m.complexity)
            })
            .collect();

        assert_eq!(counts, vec![(100, 2), (50, 1), (20, 0)]);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a/b/C.RB"), ".rb");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of("dir.d/file"), "");
    }
}
