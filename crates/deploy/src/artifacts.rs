//! Compiled contract artifacts.
//!
//! Each contract ships as a JSON file carrying its creation bytecode.
//! Manager and transceiver bytecode reference the structs library through
//! `__$...$__` link placeholders, which must be patched with the library's
//! deployed address before the code can go on chain.

use std::path::PathBuf;

use alloy::primitives::Address;
use anyhow::Context;
use serde::Deserialize;

use crate::client::ContractKind;

#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// 0x-prefixed creation bytecode, possibly with unresolved link
    /// placeholders.
    pub bytecode: String,
}

/// Directory of per-contract artifact files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(kind: ContractKind) -> &'static str {
        match kind {
            ContractKind::HubToken => "HubToken.json",
            ContractKind::SpokeToken => "SpokeToken.json",
            ContractKind::TransceiverStructs => "TransceiverStructs.json",
            ContractKind::Manager => "Manager.json",
            ContractKind::Transceiver => "Transceiver.json",
            ContractKind::Erc1967Proxy => "Erc1967Proxy.json",
        }
    }

    /// Creation bytecode for the given contract, link placeholders intact.
    pub fn creation_code(&self, kind: ContractKind) -> anyhow::Result<String> {
        let path = self.dir.join(Self::file_name(kind));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("missing contract artifact {}", path.display()))?;
        let artifact: ContractArtifact = serde_json::from_str(&content)
            .with_context(|| format!("malformed contract artifact {}", path.display()))?;
        Ok(artifact.bytecode)
    }
}

/// Replace every `__$...$__` link placeholder with the library address.
///
/// Placeholders are exactly 40 characters wide, matching the hex address
/// that replaces them, so linking never shifts code offsets.
pub fn link(bytecode: &str, library: &Address) -> String {
    let hex_addr = format!("{library:x}");
    let hex_addr = hex_addr.trim_start_matches("0x");

    let mut out = String::with_capacity(bytecode.len());
    let mut rest = bytecode;
    while let Some(start) = rest.find("__$") {
        out.push_str(&rest[..start]);
        match rest[start..].find("$__") {
            Some(end) => {
                out.push_str(hex_addr);
                rest = &rest[start + end + 3..];
            }
            None => {
                // Unterminated marker, keep as-is.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn links_single_placeholder() {
        let lib = Address::repeat_byte(0xab);
        let code = "0x6080__$93083e84e1249db917f0f27d58fa21b821$__6040";
        let linked = link(code, &lib);
        assert_eq!(
            linked,
            format!("0x6080{}6040", "ab".repeat(20)),
        );
        assert_eq!(linked.len(), code.len());
    }

    #[test]
    fn links_every_occurrence() {
        let lib = Address::repeat_byte(0x01);
        let code = "aa__$93083e84e1249db917f0f27d58fa21b821$__bb__$93083e84e1249db917f0f27d58fa21b821$__cc";
        let linked = link(code, &lib);
        assert!(!linked.contains("__$"));
        assert_eq!(linked.matches(&"01".repeat(20)).count(), 2);
    }

    #[test]
    fn plain_bytecode_is_untouched() {
        let lib = Address::repeat_byte(0x01);
        assert_eq!(link("0x60806040", &lib), "0x60806040");
    }

    #[test]
    fn missing_artifact_names_the_file() {
        let dir = TempDir::new("spoked-artifacts").unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.creation_code(ContractKind::Manager).unwrap_err();
        assert!(err.to_string().contains("Manager.json"));
    }

    #[test]
    fn reads_bytecode_from_artifact_file() {
        let dir = TempDir::new("spoked-artifacts").unwrap();
        std::fs::write(
            dir.path().join("HubToken.json"),
            r#"{"bytecode":"0x60806040","abi":[]}"#,
        )
        .unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            store.creation_code(ContractKind::HubToken).unwrap(),
            "0x60806040"
        );
    }
}
