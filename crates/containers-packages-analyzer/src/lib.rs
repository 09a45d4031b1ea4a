//! Containers packages analyzer
//!
//! Resolves the packages and layers of container images. The
//! [`PackagesAnalyzer`] trait is what the resolver depends on; [`SyftAnalyzer`]
//! implements it on top of the `syft` CLI.

pub mod analyzer;
pub mod error;
pub mod syft;

pub use analyzer::PackagesAnalyzer;
pub use error::{AnalyzeError, Result};
pub use syft::{DEFAULT_SYFT_BINARY, SyftAnalyzer, parse_syft_output};
