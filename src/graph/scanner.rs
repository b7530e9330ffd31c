//! Include directive scanner.
//!
//! Purely textual: `#include` / `#import` lines are matched whether or not
//! they sit inside a disabled `#if` block, and macro-expanded includes are
//! not seen at all.

use regex::Regex;
use std::sync::LazyLock;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^[ \t]*#[ \t]*(?:include|import)[ \t]*(?:"([^"\r\n]+)"|<([^>\r\n]+)>)"#)
        .expect("include pattern is valid")
});

/// Return the names referenced by include directives in `text`, in order.
///
/// Duplicates are kept; callers de-duplicate.
pub fn scan_includes(text: &str) -> Vec<String> {
    INCLUDE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_and_angle() {
        let src = "#include \"foo.h\"\n#include <bar/baz.h>\nint x;\n";
        assert_eq!(scan_includes(src), vec!["foo.h", "bar/baz.h"]);
    }

    #[test]
    fn test_import_and_whitespace() {
        let src = "   #  import \"Widget.h\"  \n\t#include\t<util.hpp>\r\n";
        assert_eq!(scan_includes(src), vec!["Widget.h", "util.hpp"]);
    }

    #[test]
    fn test_case_insensitive_keyword() {
        let src = "#Include \"a.h\"\n#INCLUDE \"b.h\"\n#Import <c.h>\n";
        assert_eq!(scan_includes(src), vec!["a.h", "b.h", "c.h"]);
    }

    #[test]
    fn test_duplicates_preserved() {
        let src = "#include \"a.h\"\n#include \"b.h\"\n#include \"a.h\"\n";
        assert_eq!(scan_includes(src), vec!["a.h", "b.h", "a.h"]);
    }

    #[test]
    fn test_trailing_comment_ignored() {
        let src = "#include \"a.h\" // for widgets\n#include <b.h> /* b */\n";
        assert_eq!(scan_includes(src), vec!["a.h", "b.h"]);
    }

    #[test]
    fn test_conditionals_not_evaluated() {
        let src = "#if 0\n#include \"dead.h\"\n#endif\n";
        assert_eq!(scan_includes(src), vec!["dead.h"]);
    }

    #[test]
    fn test_no_directives() {
        assert!(scan_includes("").is_empty());
        assert!(scan_includes("int main(void) { return 0; }\n").is_empty());
    }

    #[test]
    fn test_malformed_contribute_nothing() {
        let src = concat!(
            "#include foo.h\n",
            "#include \"unterminated\n",
            "#include \"mismatch.h>\n",
            "#include <>\n",
            "// #include \"commented.h\"\n",
            "x = 1; #include \"midline.h\"\n",
            "#define INC \"a.h\"\n",
            "#include INC\n",
        );
        assert!(scan_includes(src).is_empty());
    }
}
