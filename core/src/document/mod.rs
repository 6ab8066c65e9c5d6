//! Compact document format
//!
//! A document is a `#` header followed by one block per round:
//!
//! ```text
//! # MAP: de_ancient | ROUNDS: 2 | TICK: 64
//! # PLAYERS: P0:alpha P1:bravo
//!
//! ## ROUND 1 (ct win) | t1000-t4800
//! ### Positions
//! P0 1000:-1520,240,32 1032:+12,-4,+0
//! ### Events
//! 2100:D,P0>P1,AK,HS | 2400:BP,P0,A
//! ```
//!
//! - `assembler`: typed round data → text
//! - `line`: per-line classification
//! - `parser`: text → [`DecodedMatch`], collecting defects instead of failing

pub mod assembler;
pub mod line;
pub mod parser;

pub use assembler::{CompactDocument, DocumentAssembler, EncodedRound};
pub use line::{Line, Section};
pub use parser::{DecodedMatch, DocumentParser, PlayerTrack, RoundRecord};

bitflags::bitflags! {
    /// Optional header sections
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DocumentSections: u8 {
        /// `# METADATA` provenance preamble
        const PREAMBLE = 0b0000_0001;
        /// `# SITES:` bombsite markers
        const SITES = 0b0000_0010;
        /// Format legend (informational only)
        const LEGEND = 0b0000_0100;
    }
}

impl Default for DocumentSections {
    fn default() -> Self {
        DocumentSections::SITES | DocumentSections::LEGEND
    }
}
