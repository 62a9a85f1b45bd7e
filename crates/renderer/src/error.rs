//! Error taxonomy for the rendering component.
//!
//! Every variant is fatal to the background only: the contract is "degrade to
//! no background, never break the host". Callers log and stop rendering;
//! nothing here is retried automatically.

use thiserror::Error;

use crate::types::ShaderStage;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Neither the modern nor the legacy capability level could be obtained.
    #[error("no rendering context available (modern and legacy device requests both failed)")]
    NoContextAvailable,

    /// A shader stage was rejected during compilation. The diagnostic log is
    /// surfaced verbatim; a stage failure is fatal for the whole program.
    #[error("{stage} shader failed to compile: {log}")]
    CompileError { stage: ShaderStage, log: String },

    /// Stage objects compiled but the program failed to link.
    #[error("shader program failed to link: {log}")]
    LinkError { log: String },

    /// The drawable surface was lost permanently. Rendering stops; no
    /// reacquisition is attempted.
    #[error("rendering surface lost: {0}")]
    ContextLost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_the_stage() {
        let err = RenderError::CompileError {
            stage: ShaderStage::Fragment,
            log: "unexpected token".into(),
        };
        let text = err.to_string();
        assert!(text.contains("fragment"));
        assert!(text.contains("unexpected token"));
    }
}
