//! Printer model definitions: capability flags, geometry bounds, and the full model table.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::label::{Label, LABELS_PT, LABELS_PTE, LABELS_QL, LABELS_QL10_EXTRA, LABELS_QL11_EXTRA};

bitflags::bitflags! {
    /// Optional raster-protocol opcodes a [`Model`] may or may not support.
    ///
    /// Callers consult [`Model::supports`] explicitly rather than relying on
    /// the encoder silently dropping unsupported commands.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Capability: u8 {
        /// The `switch_mode` / dynamic-command-mode opcode.
        const MODE_SETTING    = 0b0000_0001;
        /// Automatic cutter opcodes (`autocut`, `cut_every`).
        const CUTTING         = 0b0000_0010;
        /// The `expanded_mode` opcode (dpi_600 / cut_at_end / two_color bits).
        const EXPANDED_MODE   = 0b0000_0100;
        /// TIFF PackBits raster compression.
        const COMPRESSION     = 0b0000_1000;
        /// Two-color (black/red/white) raster transfer.
        const TWO_COLOR       = 0b0001_0000;
    }
}

/// Family grouping that selects which [`Label`] tables a [`Model`] accepts.
///
/// Data, not a type hierarchy: rather than subclassing one model family off
/// another to inherit its label list, each variant just names which static
/// label tables get concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Family {
    /// QL 5xx/6xx/7xx/8xx series.
    Ql,
    /// QL 10xx series (adds wide labels on top of [`Family::Ql`]).
    Ql10,
    /// QL 11xx series (adds wide labels on top of [`Family::Ql10`]).
    Ql11,
    /// PT series.
    Pt,
    /// PT-E series.
    Pte,
}

impl Family {
    /// Returns the concatenated list of labels accepted by models in this family.
    #[must_use]
    pub fn labels(self) -> Vec<&'static Label> {
        match self {
            Family::Ql => LABELS_QL.iter().collect(),
            Family::Ql10 => LABELS_QL.iter().chain(LABELS_QL10_EXTRA).collect(),
            Family::Ql11 => LABELS_QL
                .iter()
                .chain(LABELS_QL10_EXTRA)
                .chain(LABELS_QL11_EXTRA)
                .collect(),
            Family::Pt => LABELS_PT.iter().collect(),
            Family::Pte => LABELS_PTE.iter().collect(),
        }
    }
}

/// A printer model/variant.
///
/// Immutable once constructed; shared immutably across all jobs that target it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    /// Human-readable identifier, e.g. `"QL-600"`.
    pub name: &'static str,
    /// Family this model belongs to (selects its label set).
    pub family: Family,
    /// USB vendor ID. `0x04F9` ("Brother Industries, Ltd.") for every known model.
    pub usb_vendor_id: u16,
    /// USB product ID.
    pub usb_product_id: u16,
    /// Inclusive (min, max) number of raster rows ("dots") that can be printed.
    pub min_max_length_dots: (u32, u32),
    /// Inclusive (min, max) feed amount in dots.
    pub min_max_feed_dots: (u32, u32),
    /// Fixed wire-format width of a single raster line, in bytes.
    pub bytes_per_row: u32,
    /// Additional offset from the right side of the label, in dots.
    pub additional_offset_r: i32,
    /// Opcodes this model supports.
    pub capabilities: Capability,
    /// Number of NUL bytes required for the `invalidate` preamble.
    pub num_invalidate_bytes: u32,
    /// Model-identification byte reported in offset 4 of a status reply, if known.
    ///
    /// Only documented for the handful of models the status-reply table has
    /// been verified against; `None` elsewhere rather than guessed.
    pub status_code: Option<u8>,
}

impl Model {
    /// Whether this model supports the given optional opcode.
    #[must_use]
    pub const fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Device pixels per raster row (`bytes_per_row * 8`).
    #[must_use]
    pub const fn device_pixel_width(&self) -> u32 {
        self.bytes_per_row * 8
    }

    /// The labels this model accepts, as determined by its [`Family`].
    #[must_use]
    pub fn labels(&self) -> Vec<&'static Label> {
        self.family.labels()
    }
}

const DEFAULT_CAPS: Capability = Capability::MODE_SETTING
    .union(Capability::CUTTING)
    .union(Capability::EXPANDED_MODE)
    .union(Capability::COMPRESSION);

macro_rules! model {
    ($name:expr, $family:expr, $min_max_len:expr, $pid:expr $(, $field:ident = $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut m = Model {
            name: $name,
            family: $family,
            usb_vendor_id: 0x04F9,
            usb_product_id: $pid,
            min_max_length_dots: $min_max_len,
            min_max_feed_dots: (35, 100),
            bytes_per_row: 90,
            additional_offset_r: 0,
            capabilities: DEFAULT_CAPS,
            num_invalidate_bytes: 200,
            status_code: None,
        };
        $(m.$field = $value;)*
        m
    }};
}

/// Every known printer model, in declaration order.
pub static ALL_MODELS: &[Model] = &[
    model!("QL-500", Family::Ql, (295, 11811), 0x2015,
        capabilities = Capability::empty(),
    ),
    model!("QL-550", Family::Ql, (295, 11811), 0x2016,
        capabilities = DEFAULT_CAPS.difference(Capability::COMPRESSION).difference(Capability::MODE_SETTING),
    ),
    model!("QL-560", Family::Ql, (295, 11811), 0x2027,
        capabilities = DEFAULT_CAPS.difference(Capability::COMPRESSION).difference(Capability::MODE_SETTING),
        status_code = Some(0x31),
    ),
    model!("QL-570", Family::Ql, (150, 11811), 0x2028,
        capabilities = DEFAULT_CAPS.difference(Capability::COMPRESSION).difference(Capability::MODE_SETTING),
        status_code = Some(0x32),
    ),
    model!("QL-580N", Family::Ql, (150, 11811), 0x2029, status_code = Some(0x33)),
    model!("QL-600", Family::Ql, (150, 11811), 0x20C0, status_code = Some(0x47)),
    model!("QL-650TD", Family::Ql, (295, 11811), 0x201B, status_code = Some(0x51)),
    model!("QL-700", Family::Ql, (150, 11811), 0x2042,
        capabilities = DEFAULT_CAPS.difference(Capability::COMPRESSION).difference(Capability::MODE_SETTING),
        status_code = Some(0x35),
    ),
    model!("QL-710W", Family::Ql, (150, 11811), 0x2043, status_code = Some(0x36)),
    model!("QL-720NW", Family::Ql, (150, 11811), 0x2044, status_code = Some(0x37)),
    model!("QL-800", Family::Ql, (150, 11811), 0x209B,
        capabilities = DEFAULT_CAPS.union(Capability::TWO_COLOR).difference(Capability::COMPRESSION),
        num_invalidate_bytes = 400,
        status_code = Some(0x38),
    ),
    model!("QL-810W", Family::Ql, (150, 11811), 0x209C,
        capabilities = DEFAULT_CAPS.union(Capability::TWO_COLOR),
        num_invalidate_bytes = 400,
        status_code = Some(0x39),
    ),
    model!("QL-820NWB", Family::Ql, (150, 11811), 0x209D,
        capabilities = DEFAULT_CAPS.union(Capability::TWO_COLOR),
        num_invalidate_bytes = 400,
        status_code = Some(0x41),
    ),
    model!("QL-1050", Family::Ql10, (295, 35433), 0x2020,
        bytes_per_row = 162, additional_offset_r = 44,
    ),
    model!("QL-1060N", Family::Ql10, (295, 35433), 0x202A,
        bytes_per_row = 162, additional_offset_r = 44,
    ),
    model!("QL-1100", Family::Ql11, (301, 35434), 0x20A7,
        bytes_per_row = 162, additional_offset_r = 44,
    ),
    model!("QL-1100NWB", Family::Ql11, (301, 35434), 0x20A8,
        bytes_per_row = 162, additional_offset_r = 44,
    ),
    model!("QL-1115NWB", Family::Ql11, (301, 35434), 0x20AC,
        bytes_per_row = 162, additional_offset_r = 44,
    ),
    model!("PT-P750W", Family::Pt, (31, 14172), 0x0000, bytes_per_row = 16),
    model!("PT-P900W", Family::Pt, (57, 28346), 0x0000, bytes_per_row = 70),
    model!("PT-P950NW", Family::Pt, (57, 28346), 0x0000, bytes_per_row = 70),
    model!("PT-E550W", Family::Pte, (31, 14172), 0x2060, bytes_per_row = 16),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_has_at_least_one_label() {
        for model in ALL_MODELS {
            assert!(!model.labels().is_empty(), "{} has no labels", model.name);
        }
    }

    #[test]
    fn ql500_does_not_support_cutting_capability_bundle() {
        let ql500 = ALL_MODELS.iter().find(|m| m.name == "QL-500").unwrap();
        assert!(!ql500.supports(Capability::MODE_SETTING));
        assert!(!ql500.supports(Capability::EXPANDED_MODE));
        assert!(!ql500.supports(Capability::COMPRESSION));
    }
}
