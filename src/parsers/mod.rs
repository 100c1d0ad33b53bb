pub mod lcov;

use crate::error::Result;
use crate::model::CoverageSnapshot;

/// Every report parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into our coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageSnapshot>;
}
