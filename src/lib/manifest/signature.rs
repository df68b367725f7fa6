//! `signature.manifest` (spec §6): a single entry with `sha256sum` (of
//! `packages.manifest`) and `signature` (base64-encoded RSA-encrypted
//! digest). The actual cryptographic operation is an external
//! collaborator (spec §1); this module only parses/renders the manifest
//! and hands the recovered digest to `repository::auth`.

use serde::{Deserialize, Serialize};

use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignatureManifest {
    pub sha256sum: String,
    pub signature_base64: String,
}

impl SignatureManifest {
    pub fn parse(raw: &str) -> Res<Self> {
        let entries = super::parse_entries(raw)?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| ErrorKind::InvalidManifestFile("empty signature manifest".to_string()))?;

        Ok(SignatureManifest {
            sha256sum: entry.require("sha256sum")?.to_string(),
            signature_base64: entry.require("signature")?.to_string(),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "sha256sum: {}\nsignature: {}\n",
            self.sha256sum, self.signature_base64
        )
    }

    pub fn signature_bytes(&self) -> Res<Vec<u8>> {
        base64::decode(&self.signature_base64)
            .map_err(|_| ErrorKind::InvalidSignature("malformed base64".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_roundtrips() {
        let raw = "sha256sum: abcd1234\nsignature: aGVsbG8=\n";
        let m = SignatureManifest::parse(raw).unwrap();
        assert_eq!(m.sha256sum, "abcd1234");
        assert_eq!(m.signature_bytes().unwrap(), b"hello");
        assert_eq!(SignatureManifest::parse(&m.render()).unwrap().sha256sum, m.sha256sum);
    }
}
