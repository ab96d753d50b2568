//! Symbol-table loader backed by `<binary> tool nm`
//!
//! Tracks which symbols the ingested archives define and reference. It does
//! not relocate code; its serialized state lists the archives and symbols a
//! runtime loader has to bind.

use crate::error::{LoadkitError, LoadkitResult};
use crate::link::loader::{HostSymbols, Loader};
use crate::toolchain::{command_line, error_tail};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Symbol type letters printed by nm
const SYMBOL_KINDS: &str = "TtDdBbRrUC";

/// Undefined (referenced) symbol
const UNDEFINED: char = 'U';

/// One line of nm output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmSymbol {
    pub addr: Option<u64>,
    pub kind: char,
    pub name: String,
}

impl NmSymbol {
    pub fn is_defined(&self) -> bool {
        self.kind != UNDEFINED
    }
}

/// An archive ingested into [`NmLinker`]
#[derive(Debug, Clone, Serialize)]
pub struct LinkedObject {
    pub package: String,
    pub archive: PathBuf,
}

/// Linker state of [`NmLoader`]
#[derive(Debug, Default, Serialize)]
pub struct NmLinker {
    pub objects: Vec<LinkedObject>,
    pub defined: BTreeSet<String>,
    pub referenced: BTreeSet<String>,
}

impl NmLinker {
    fn ingest(&mut self, archive: &Path, package: &str, symbols: Vec<NmSymbol>) {
        for symbol in symbols {
            if symbol.is_defined() {
                self.defined.insert(symbol.name);
            } else {
                self.referenced.insert(symbol.name);
            }
        }
        self.objects.push(LinkedObject {
            package: package.to_string(),
            archive: archive.to_path_buf(),
        });
    }
}

/// Loader reading symbol tables with the toolchain's nm
#[derive(Debug, Clone)]
pub struct NmLoader {
    binary: String,
}

impl NmLoader {
    /// Create a loader using `binary tool nm`
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Defined symbols of a host executable, with their addresses
    pub async fn host_symbols(&self, executable: &Path) -> LoadkitResult<HostSymbols> {
        let symbols = self.symbols(executable).await?;
        Ok(symbols
            .into_iter()
            .filter(NmSymbol::is_defined)
            .filter_map(|s| s.addr.map(|addr| (s.name, addr)))
            .collect())
    }

    async fn symbols(&self, path: &Path) -> LoadkitResult<Vec<NmSymbol>> {
        let args = vec![
            "tool".to_string(),
            "nm".to_string(),
            path.display().to_string(),
        ];
        let command = command_line(&self.binary, &args);
        debug!("Executing: {}", command);

        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LoadkitError::loader(format!("running '{}'", command), e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LoadkitError::loader(
                format!("running '{}'", command),
                error_tail(&stdout, &stderr),
            ));
        }
        Ok(parse_nm_output(&stdout))
    }
}

#[async_trait]
impl Loader for NmLoader {
    type Linker = NmLinker;

    async fn read_obj(&self, archive: &Path, package: &str) -> LoadkitResult<NmLinker> {
        let mut linker = NmLinker::default();
        linker.ingest(archive, package, self.symbols(archive).await?);
        Ok(linker)
    }

    async fn read_dependency(
        &self,
        linker: &mut NmLinker,
        archive: &Path,
        package: &str,
        unresolved: &[String],
    ) -> LoadkitResult<()> {
        let symbols = self.symbols(archive).await?;
        let bound = symbols
            .iter()
            .filter(|s| s.is_defined() && unresolved.contains(&s.name))
            .count();
        debug!("{} binds {} of {} unresolved", package, bound, unresolved.len());
        linker.ingest(archive, package, symbols);
        Ok(())
    }

    fn unresolved_symbols(&self, linker: &NmLinker, host: &HostSymbols) -> Vec<String> {
        linker
            .referenced
            .iter()
            .filter(|name| !linker.defined.contains(*name) && !host.contains(name))
            .cloned()
            .collect()
    }

    fn serialize(&self, linker: &NmLinker, sink: &mut dyn Write) -> LoadkitResult<()> {
        serde_json::to_writer_pretty(&mut *sink, linker)?;
        writeln!(sink).map_err(|e| LoadkitError::io("writing linker state", e))
    }
}

/// Parse nm output, skipping lines that are not symbols
pub fn parse_nm_output(output: &str) -> Vec<NmSymbol> {
    output.lines().filter_map(parse_nm_line).collect()
}

/// Parse `[member:] [addr] kind name`; names may contain spaces.
fn parse_nm_line(line: &str) -> Option<NmSymbol> {
    let mut rest = line.trim();
    if let Some((head, tail)) = rest.split_once(char::is_whitespace) {
        if head.ends_with(':') {
            rest = tail.trim_start();
        }
    }

    let (first, tail) = rest.split_once(char::is_whitespace)?;
    let tail = tail.trim_start();

    if let Some(kind) = symbol_kind(first) {
        // A lone kind letter followed by another kind letter was a short address
        let next_is_kind = tail
            .split_once(char::is_whitespace)
            .is_some_and(|(next, _)| symbol_kind(next).is_some());
        if !next_is_kind {
            return named(None, kind, tail);
        }
    }

    let addr = u64::from_str_radix(first, 16).ok()?;
    let (kind, name) = tail.split_once(char::is_whitespace)?;
    named(Some(addr), symbol_kind(kind)?, name)
}

fn named(addr: Option<u64>, kind: char, name: &str) -> Option<NmSymbol> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(NmSymbol {
        addr,
        kind,
        name: name.to_string(),
    })
}

fn symbol_kind(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if SYMBOL_KINDS.contains(c) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
  4a8f60 T main.main
         U fmt.Println
  4b0000 D main.counter
  4c1000 R type:struct { F int }
_go_.o:   51e0 t alpha.helper
       b T main.tiny
";

    #[test]
    fn parses_defined_and_undefined() {
        let symbols = parse_nm_output(OUTPUT);
        assert_eq!(symbols.len(), 6);
        assert_eq!(
            symbols[0],
            NmSymbol {
                addr: Some(0x4a8f60),
                kind: 'T',
                name: "main.main".to_string()
            }
        );
        assert_eq!(symbols[1].kind, 'U');
        assert_eq!(symbols[1].addr, None);
        assert_eq!(symbols[3].name, "type:struct { F int }");
        assert_eq!(symbols[4].name, "alpha.helper");
        assert_eq!(symbols[5].addr, Some(0xb));
        assert_eq!(symbols[5].name, "main.tiny");
    }

    #[test]
    fn skips_noise() {
        assert!(parse_nm_output("\nwarning: no symbols\n").is_empty());
    }

    #[test]
    fn unresolved_excludes_defined_and_host() {
        let loader = NmLoader::new("go");
        let mut linker = NmLinker::default();
        linker.ingest(
            Path::new("/t/main/main.a"),
            "main",
            parse_nm_output(OUTPUT),
        );
        linker.ingest(
            Path::new("/t/alpha/alpha.a"),
            "alpha",
            parse_nm_output("   10 T alpha.Foo\n      U strings.Cut\n"),
        );
        linker.referenced.insert("alpha.Foo".to_string());

        let mut host = HostSymbols::new();
        assert_eq!(
            loader.unresolved_symbols(&linker, &host),
            vec!["fmt.Println", "strings.Cut"]
        );

        host.insert("fmt.Println", 0x100);
        assert_eq!(loader.unresolved_symbols(&linker, &host), vec!["strings.Cut"]);
    }

    #[test]
    fn serializes_objects() {
        let loader = NmLoader::new("go");
        let mut linker = NmLinker::default();
        linker.ingest(Path::new("/t/main/main.a"), "main", parse_nm_output(OUTPUT));

        let mut sink = Vec::new();
        loader.serialize(&linker, &mut sink).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&sink).unwrap();
        assert_eq!(value["objects"][0]["package"], "main");
        assert!(value["defined"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| *s == "main.main"));
    }
}
