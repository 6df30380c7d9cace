//! Checks that `tests/unit` mirrors the module tree of `src`

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    fn root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Relative paths of all Rust files below `dir`
    fn rust_files(dir: &Path) -> io::Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "rs") {
                    let Ok(relative) = path.strip_prefix(dir) else {
                        return Err(io::Error::other("path outside of scanned directory"));
                    };
                    files.insert(relative.to_path_buf());
                }
            }
        }
        Ok(files)
    }

    /// Files that hold analysis code rather than module wiring
    fn module_files(files: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
        files
            .iter()
            .filter(|path| {
                let name = path.file_name().and_then(|name| name.to_str());
                !matches!(name, Some("mod.rs" | "lib.rs" | "main.rs"))
            })
            .cloned()
            .collect()
    }

    /// Names declared with `mod name;` or `pub mod name;`
    fn declared_modules(source: &str) -> BTreeSet<String> {
        source
            .lines()
            .map(str::trim)
            .map(|line| line.strip_prefix("pub ").unwrap_or(line))
            .filter_map(|line| line.strip_prefix("mod "))
            .filter_map(|line| line.strip_suffix(';'))
            .map(str::to_string)
            .collect()
    }

    /// Modules of a directory that its module file doesn't declare
    fn undeclared(dir: &Path, module_file: &str) -> io::Result<Vec<String>> {
        let declared = declared_modules(&fs::read_to_string(dir.join(module_file))?);
        let mut missing = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let name = if path.is_dir() {
                if !path.join("mod.rs").exists() {
                    continue;
                }
                missing.extend(undeclared(&path, "mod.rs")?);
                path.file_name().and_then(|name| name.to_str()).map(str::to_string)
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
            } else {
                None
            };
            let Some(name) = name else { continue };
            if matches!(name.as_str(), "mod" | "lib" | "main") {
                continue;
            }
            if !declared.contains(&name) {
                missing.push(format!("  - {} in {}", name, dir.join(module_file).display()));
            }
        }
        Ok(missing)
    }

    fn listing(paths: &BTreeSet<&PathBuf>, prefix: &str) -> String {
        paths
            .iter()
            .map(|path| format!("  - {prefix}/{}", path.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Tests every analysis module has a unit test file and no test file is orphaned
    #[test]
    fn test_unit_tests_mirror_src() {
        let src = module_files(&rust_files(&root().join("src")).expect("src readable"));
        let unit = module_files(&rust_files(&root().join("tests/unit")).expect("tests/unit readable"));

        let untested: BTreeSet<&PathBuf> = src.difference(&unit).collect();
        assert!(
            untested.is_empty(),
            "Modules without unit tests:\n{}",
            listing(&untested, "src")
        );

        let orphaned: BTreeSet<&PathBuf> = unit.difference(&src).collect();
        assert!(
            orphaned.is_empty(),
            "Unit tests without a module:\n{}",
            listing(&orphaned, "tests/unit")
        );
    }

    // Tests every file is reachable from the crate root and the unit test root
    #[test]
    fn test_modules_declared() {
        let mut missing = undeclared(&root().join("src"), "lib.rs").expect("src readable");
        missing.extend(undeclared(&root().join("tests/unit"), "mod.rs").expect("tests/unit readable"));
        assert!(
            missing.is_empty(),
            "Files never compiled because no module declares them:\n{}",
            missing.join("\n")
        );
    }

    // Tests the module file parser reads private and public declarations
    #[test]
    fn test_declared_modules() {
        let source = "//! Docs\n\n/// Plates\npub mod plate;\nmod record;\nuse crate::x;\n";
        let declared = declared_modules(source);
        assert_eq!(
            declared,
            BTreeSet::from(["plate".to_string(), "record".to_string()])
        );
    }

    // Tests every test file outside module wiring holds at least one test
    #[test]
    fn test_test_files_contain_tests() {
        let tests_dir = root().join("tests");
        let empty: Vec<String> = rust_files(&tests_dir)
            .expect("tests readable")
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|name| name != "mod.rs"))
            .filter(|path| {
                !fs::read_to_string(tests_dir.join(path))
                    .is_ok_and(|content| content.contains("#[test]"))
            })
            .map(|path| format!("  - tests/{}", path.display()))
            .collect();
        assert!(
            empty.is_empty(),
            "Test files without a #[test] function:\n{}",
            empty.join("\n")
        );
    }
}
