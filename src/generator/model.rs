//! Model seam for chunked generation.
//!
//! Each input row is `p q theta phi`; the model maps a chunk of rows to one
//! complex harmonic per row. The inference backend itself is outside this
//! crate's scope.

use crate::error::GenerateError;

/// One parsed input row: `p q theta phi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRow {
    pub p: f32,
    pub q: f32,
    pub theta: f32,
    pub phi: f32,
}

/// One predicted complex value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub re: f32,
    pub im: f32,
}

/// Maps a chunk of input rows to predictions, one per row.
pub trait HarmonicModel: Send + Sync {
    fn predict(&self, rows: &[InputRow]) -> Result<Vec<Harmonic>, GenerateError>;
}

/// Deterministic stand-in model that echoes each row's angles.
///
/// Used by the CLI and tests where a real inference backend would plug in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughModel;

impl HarmonicModel for PassthroughModel {
    fn predict(&self, rows: &[InputRow]) -> Result<Vec<Harmonic>, GenerateError> {
        Ok(rows
            .iter()
            .map(|row| Harmonic {
                re: row.theta,
                im: row.phi,
            })
            .collect())
    }
}
