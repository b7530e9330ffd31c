//! Makefile fragment writer.

use std::fmt::Write;

use super::{BuildReport, CompileUnit};
use crate::config::MakeConfig;
use crate::graph::FileKind;

/// Extensions compiled with the C++ compiler.
const CXX_EXTENSIONS: &[&str] = &["cc", "cpp", "cxx", "c++", "C", "mm"];

/// Render `report` as a self-contained Makefile.
pub fn render(report: &BuildReport, make: &MakeConfig) -> String {
    let mut out = String::new();
    let any_cxx = report.compile_units.iter().any(is_cxx);
    let object_dir = make.object_dir.trim_end_matches('/');
    let objects: Vec<String> = report
        .compile_units
        .iter()
        .map(|unit| object_path(unit, object_dir))
        .collect();

    let _ = writeln!(out, "# Generated by cdeps from {}. Do not edit.", report.root);
    out.push('\n');
    write_var(&mut out, "CC", &make.cc);
    write_var(&mut out, "CXX", &make.cxx);
    write_var(&mut out, "CFLAGS", &make.cflags);
    write_var(&mut out, "CXXFLAGS", &make.cxxflags);
    write_var(&mut out, "LDFLAGS", &make.ldflags);
    write_var(&mut out, "LIBS", &make.libs);
    write_var(&mut out, "TARGET", &make.target);
    let includes: Vec<String> = report
        .include_dirs
        .iter()
        .map(|dir| format!("-I{}", escape(dir)))
        .collect();
    write_var(&mut out, "INCLUDES", &includes.join(" "));
    write_list(&mut out, "OBJS", &objects);

    out.push_str("\n.PHONY: all clean\n\nall: $(TARGET)\n\n");
    let linker = if any_cxx { "$(CXX)" } else { "$(CC)" };
    let _ = writeln!(out, "$(TARGET): $(OBJS)");
    let _ = writeln!(out, "\t{linker} $(LDFLAGS) -o $@ $(OBJS) $(LIBS)");

    let header_rules: Vec<_> = report.dependencies_of_kind(FileKind::Header).collect();
    if !header_rules.is_empty() {
        out.push_str("\n# header dependencies\n");
        for deps in header_rules {
            write_rule(&mut out, &deps.file, &deps.headers);
        }
    }

    let source_rules: Vec<_> = report
        .dependencies_of_kind(FileKind::Implementation)
        .collect();
    if !source_rules.is_empty() {
        out.push_str("\n# source dependencies\n");
        for deps in source_rules {
            write_rule(&mut out, &deps.file, &deps.headers);
        }
    }

    if !report.compile_units.is_empty() {
        out.push_str("\n# objects\n");
        if !object_dir.is_empty() && object_dir != "." {
            let dir = escape(object_dir);
            let _ = writeln!(out, "$(OBJS): | {dir}");
            let _ = writeln!(out, "{dir}:\n\tmkdir -p $@");
        }
        for (unit, object) in report.compile_units.iter().zip(&objects) {
            let recipe = if is_cxx(unit) {
                &make.cxx_compile
            } else {
                &make.c_compile
            };
            let _ = writeln!(out, "{}: {}", escape(object), escape(&unit.source));
            let _ = writeln!(out, "\t{recipe}");
        }
    }

    out.push_str("\nclean:\n\trm -f $(TARGET) $(OBJS)\n");
    out
}

fn is_cxx(unit: &CompileUnit) -> bool {
    CXX_EXTENSIONS.contains(&unit.extension.as_str())
}

/// Object file for `unit`. [`BuildReport::new`] rejects two units with one module.
fn object_path(unit: &CompileUnit, object_dir: &str) -> String {
    if object_dir.is_empty() || object_dir == "." {
        format!("{}.o", unit.module)
    } else {
        format!("{object_dir}/{}.o", unit.module)
    }
}

fn write_var(out: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        let _ = writeln!(out, "{name} =");
    } else {
        let _ = writeln!(out, "{name} = {value}");
    }
}

fn write_list(out: &mut String, name: &str, values: &[String]) {
    if values.is_empty() {
        let _ = writeln!(out, "{name} =");
        return;
    }
    let _ = write!(out, "{name} =");
    for value in values {
        let _ = write!(out, " \\\n\t{}", escape(value));
    }
    out.push('\n');
}

fn write_rule(out: &mut String, target: &str, prerequisites: &[String]) {
    let _ = write!(out, "{}:", escape(target));
    for prerequisite in prerequisites {
        let _ = write!(out, " {}", escape(prerequisite));
    }
    out.push('\n');
}

/// Escape characters make treats specially in target and prerequisite lists.
fn escape(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            ' ' | '#' | ':' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '$' => escaped.push_str("$$"),
            _ => escaped.push(c),
        }
    }
    escaped
}
