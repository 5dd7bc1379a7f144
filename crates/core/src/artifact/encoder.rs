//! QR symbol encoding.

use qrcode::{Color, EcLevel, QrCode};

use super::error::ArtifactError;
use super::types::Symbol;

/// Turns ticket code text into a scannable symbol.
pub trait SymbolEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Symbol, ArtifactError>;
}

/// QR encoder backed by the `qrcode` crate, medium error correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrSymbolEncoder;

impl QrSymbolEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolEncoder for QrSymbolEncoder {
    fn encode(&self, text: &str) -> Result<Symbol, ArtifactError> {
        if text.is_empty() {
            return Err(ArtifactError::encoding(text, "empty payload"));
        }

        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
            .map_err(|e| ArtifactError::encoding(text, e))?;

        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();

        Symbol::new(code.width(), modules)
            .ok_or_else(|| ArtifactError::encoding(text, "encoder returned a non-square matrix"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ticket_code() {
        let code = format!("{}-1", "a".repeat(64));
        let symbol = QrSymbolEncoder::new().encode(&code).unwrap();

        // Version sizes are 17 + 4v modules.
        assert_eq!((symbol.width() - 17) % 4, 0);
        assert!(symbol.dark_count() > 0);
        // Top-left finder pattern corner is always dark.
        assert!(symbol.is_dark(0, 0));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = QrSymbolEncoder::new();
        assert_eq!(encoder.encode("abc-1").unwrap(), encoder.encode("abc-1").unwrap());
    }

    #[test]
    fn test_empty_payload_fails() {
        let err = QrSymbolEncoder::new().encode("").unwrap_err();
        assert!(matches!(err, ArtifactError::Encoding { .. }));
    }

    #[test]
    fn test_oversized_payload_fails() {
        let err = QrSymbolEncoder::new().encode(&"x".repeat(4000)).unwrap_err();
        assert!(matches!(err, ArtifactError::Encoding { .. }));
    }
}
