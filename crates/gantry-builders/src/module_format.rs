//! Module format detection
//!
//! Whether a config file is ESM or CommonJS decides how the patched
//! replacement must be written. The format is determined by scanning the
//! comment-stripped source for module syntax; project code is never
//! evaluated.

/// JavaScript module flavor of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

/// Detect the module format of a JavaScript source.
///
/// ESM syntax (`import`/`export` statements) wins over CommonJS markers
/// because a file mixing both only parses as ESM. A file with neither is
/// treated as CommonJS, matching Node's default for `.js`.
pub fn detect_module_format(source: &str) -> ModuleFormat {
    let stripped = strip_comments_and_strings(source);

    for line in stripped.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("import ")
            || trimmed.starts_with("import{")
            || trimmed.starts_with("export ")
            || trimmed.starts_with("export{")
            || trimmed.starts_with("export default")
        {
            return ModuleFormat::Esm;
        }
    }

    ModuleFormat::Cjs
}

/// Blank out comments and string literal contents, preserving line
/// structure so the caller can still reason per line.
fn strip_comments_and_strings(source: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(char),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '"' | '\'' | '`' => {
                    state = State::Str(c);
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                }
            }
            State::Str(quote) => match c {
                '\\' => {
                    chars.next();
                }
                _ if c == quote => {
                    out.push(c);
                    state = State::Code;
                }
                '\n' => out.push('\n'),
                _ => {}
            },
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjs_config() {
        let source = "module.exports = { appDirectory: \"app\" };\n";
        assert_eq!(detect_module_format(source), ModuleFormat::Cjs);
    }

    #[test]
    fn test_esm_config() {
        let source = "export default { appDirectory: \"app\" };\n";
        assert_eq!(detect_module_format(source), ModuleFormat::Esm);
    }

    #[test]
    fn test_esm_import_statement() {
        let source = "import { defineConfig } from \"x\";\nmodule.exports = {};\n";
        assert_eq!(detect_module_format(source), ModuleFormat::Esm);
    }

    #[test]
    fn test_commented_export_does_not_count() {
        let source = "// export default {}\n/* export const a = 1 */\nmodule.exports = {};\n";
        assert_eq!(detect_module_format(source), ModuleFormat::Cjs);
    }

    #[test]
    fn test_export_inside_string_does_not_count() {
        let source = "const s = \"export default nothing\";\nmodule.exports = { s };\n";
        assert_eq!(detect_module_format(source), ModuleFormat::Cjs);
    }

    #[test]
    fn test_empty_source_defaults_to_cjs() {
        assert_eq!(detect_module_format(""), ModuleFormat::Cjs);
    }
}
