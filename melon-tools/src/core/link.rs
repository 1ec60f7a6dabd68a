// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Library linking.
//!
//! The compiler emits unlinked bytecode containing fixed-width placeholder
//! tokens where a library address belongs. Linking is a pure text rewrite of
//! that hex, performed before the creation bytecode can be decoded.

use alloy::primitives::Address;

/// Width of a linker placeholder token, the width of a hex-encoded address.
const PLACEHOLDER_WIDTH: usize = 40;
/// Library names longer than this are truncated inside the placeholder.
const NAME_WIDTH: usize = 36;

/// A library to substitute into unlinked bytecode.
#[derive(Debug, Clone)]
pub struct LinkedLibrary {
    pub name: String,
    pub address: String,
}

impl LinkedLibrary {
    pub fn new(name: impl Into<String>, address: impl ToString) -> Self {
        Self {
            name: name.into(),
            address: address.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("invalid address {address:?} for library {library}")]
    InvalidAddress { library: String, address: String },
    #[error("no placeholder for library {library} in bytecode (expected {placeholder})")]
    MissingPlaceholder {
        library: String,
        placeholder: String,
    },
}

/// Returns the placeholder token the compiler emits for a library name.
pub fn placeholder(name: &str) -> String {
    let name = if name.len() > NAME_WIDTH {
        &name[..NAME_WIDTH]
    } else {
        name
    };
    format!("__{name:_<width$}", width = PLACEHOLDER_WIDTH - 2)
}

/// Substitutes library addresses for their placeholder tokens in hex bytecode.
///
/// Both failure cases are build or configuration mismatches that nothing
/// downstream can repair, so callers are expected to abort the run on error.
pub fn link(bytecode: &str, libraries: &[LinkedLibrary]) -> Result<String, LinkError> {
    let mut code = bytecode.to_string();
    for library in libraries {
        let address: Address =
            library
                .address
                .parse()
                .map_err(|_| LinkError::InvalidAddress {
                    library: library.name.clone(),
                    address: library.address.clone(),
                })?;
        let token = placeholder(&library.name);
        if !code.contains(&token) {
            return Err(LinkError::MissingPlaceholder {
                library: library.name.clone(),
                placeholder: token,
            });
        }
        code = code.replace(&token, &hex::encode(address));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x7ed1e469fcb3ee19c0366d829e291451be638e59";

    #[test]
    fn placeholder_is_forty_characters() {
        let token = placeholder("Conversion");
        assert_eq!(token.len(), PLACEHOLDER_WIDTH);
        assert!(token.starts_with("__Conversion"));
        assert!(token.ends_with('_'));
    }

    #[test]
    fn placeholder_truncates_long_names() {
        let name = "AVeryLongLibraryNameThatExceedsTheTokenWidth";
        let token = placeholder(name);
        assert_eq!(token.len(), PLACEHOLDER_WIDTH);
        assert_eq!(&token[2..2 + NAME_WIDTH], &name[..NAME_WIDTH]);
        assert!(token.ends_with("__"));
    }

    #[test]
    fn links_every_occurrence_in_place() {
        let token = placeholder("Conversion");
        let bytecode = format!("6080{token}5050{token}00");
        let libraries = [LinkedLibrary::new("Conversion", ADDRESS)];

        let linked = link(&bytecode, &libraries).unwrap();
        assert_eq!(linked.len(), bytecode.len());
        assert!(!linked.contains("__"));
        assert_eq!(&linked[4..44], &ADDRESS[2..]);
        assert_eq!(&linked[48..88], &ADDRESS[2..]);
        assert!(linked.ends_with("00"));
    }

    #[test]
    fn rejects_invalid_library_address() {
        let bytecode = format!("6080{}", placeholder("Conversion"));
        let libraries = [LinkedLibrary::new("Conversion", "not-an-address")];
        let err = link(&bytecode, &libraries).unwrap_err();
        assert!(matches!(err, LinkError::InvalidAddress { .. }));
    }

    #[test]
    fn rejects_library_without_placeholder() {
        let libraries = [LinkedLibrary::new("Conversion", ADDRESS)];
        let err = link("60806040", &libraries).unwrap_err();
        assert!(matches!(err, LinkError::MissingPlaceholder { .. }));
    }
}
