//! Label (media) definitions: form factors, colors, and per-family geometry tables.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical shape of a piece of media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormFactor {
    /// Rectangular, pre-sized label.
    DieCut,
    /// Continuous tape of fixed width, variable length.
    Endless,
    /// Round, pre-sized label.
    RoundDieCut,
    /// Continuous P-touch tape.
    PtouchEndless,
}

/// Color set a label supports printing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    /// Black ink on white media.
    BlackWhite,
    /// Black and red ink on white media.
    BlackRedWhite,
}

/// A single media (label) type.
///
/// Invariant: `dots_printable <= dots_total` on each axis. For endless and
/// P-touch-endless form factors, the length component of `tape_size_mm`,
/// `dots_total` and `dots_printable` is always `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Label {
    /// User-facing identifier aliases (e.g. `"62"`, `"DK-22205"`).
    pub identifiers: &'static [&'static str],
    /// Tape size (width, length) in millimeters. Length is `0` for endless media.
    pub tape_size_mm: (u32, u32),
    /// Physical shape of the media.
    pub form_factor: FormFactor,
    /// Total area (width, length) in dots at 300 DPI.
    pub dots_total: (u32, u32),
    /// Printable area (width, length) in dots at 300 DPI. Length is `0` for endless media.
    pub dots_printable: (u32, u32),
    /// Required offset from the right side of the label, in dots, for a centered printout.
    ///
    /// Usually non-negative; a handful of large endless labels need a small
    /// negative correction.
    pub offset_r: i32,
    /// Additional feed amount applied when printing this label, in dots.
    pub feed_margin: u32,
    /// Supported color set.
    pub color: Color,
}

impl Label {
    /// Whether this label is an endless (variable-length) form factor.
    #[must_use]
    pub const fn is_endless(&self) -> bool {
        matches!(self.form_factor, FormFactor::Endless | FormFactor::PtouchEndless)
    }

    /// Human readable name describing the label's size and form factor.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut out = match self.form_factor {
            FormFactor::DieCut => format!("{}mm x {}mm die-cut", self.tape_size_mm.0, self.tape_size_mm.1),
            FormFactor::RoundDieCut => format!("{}mm round die-cut", self.tape_size_mm.0),
            FormFactor::Endless | FormFactor::PtouchEndless => {
                format!("{}mm endless", self.tape_size_mm.0)
            }
        };
        if self.color == Color::BlackRedWhite {
            out.push_str(" (black/red/white)");
        }
        out
    }

    /// Validates the invariants documented on this type. Used by catalog self-tests.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.dots_printable.0 > self.dots_total.0 || self.dots_printable.1 > self.dots_total.1 {
            return Err(format!(
                "label {:?}: printable dots {:?} exceed total dots {:?}",
                self.identifiers, self.dots_printable, self.dots_total
            ));
        }
        if self.is_endless() && (self.tape_size_mm.1 != 0 || self.dots_total.1 != 0 || self.dots_printable.1 != 0) {
            return Err(format!(
                "label {:?}: endless form factor must have zero length fields",
                self.identifiers
            ));
        }
        Ok(())
    }
}

macro_rules! label {
    ($ids:expr, $tape:expr, $form:expr, $total:expr, $printable:expr, $offset_r:expr $(,)?) => {
        Label {
            identifiers: $ids,
            tape_size_mm: $tape,
            form_factor: $form,
            dots_total: $total,
            dots_printable: $printable,
            offset_r: $offset_r,
            feed_margin: 0,
            color: Color::BlackWhite,
        }
    };
    ($ids:expr, $tape:expr, $form:expr, $total:expr, $printable:expr, $offset_r:expr, feed = $feed:expr $(,)?) => {
        Label {
            identifiers: $ids,
            tape_size_mm: $tape,
            form_factor: $form,
            dots_total: $total,
            dots_printable: $printable,
            offset_r: $offset_r,
            feed_margin: $feed,
            color: Color::BlackWhite,
        }
    };
    ($ids:expr, $tape:expr, $form:expr, $total:expr, $printable:expr, $offset_r:expr, feed = $feed:expr, color = $color:expr $(,)?) => {
        Label {
            identifiers: $ids,
            tape_size_mm: $tape,
            form_factor: $form,
            dots_total: $total,
            dots_printable: $printable,
            offset_r: $offset_r,
            feed_margin: $feed,
            color: $color,
        }
    };
}

/// Labels accepted by every `QL` model.
pub static LABELS_QL: &[Label] = &[
    label!(&["12", "DK-22214"], (12, 0), FormFactor::Endless, (142, 0), (106, 0), 29, feed = 35),
    label!(&["18"], (18, 0), FormFactor::Endless, (256, 0), (234, 0), 171, feed = 14),
    label!(&["29", "DK-22210"], (29, 0), FormFactor::Endless, (342, 0), (306, 0), 6, feed = 35),
    label!(&["38", "DK-22225"], (38, 0), FormFactor::Endless, (449, 0), (413, 0), 12, feed = 35),
    label!(&["50", "DK-22223"], (50, 0), FormFactor::Endless, (590, 0), (554, 0), 12, feed = 35),
    label!(&["54", "DK-N55224"], (54, 0), FormFactor::Endless, (636, 0), (590, 0), 0, feed = 35),
    label!(&["62", "DK-22205", "DK-44205", "DK-44605"], (62, 0), FormFactor::Endless, (732, 0), (696, 0), 12, feed = 35),
    label!(
        &["62red", "DK-22251"], (62, 0), FormFactor::Endless, (732, 0), (696, 0), 12,
        feed = 35, color = Color::BlackRedWhite,
    ),
    label!(&["17x54", "DK-11204"], (17, 54), FormFactor::DieCut, (201, 636), (165, 566), 0),
    label!(&["17x87", "DK-11203"], (17, 87), FormFactor::DieCut, (201, 1026), (165, 956), 0),
    label!(&["23x23", "DK-11221"], (23, 23), FormFactor::DieCut, (272, 272), (202, 202), 42),
    label!(&["29x42"], (29, 42), FormFactor::DieCut, (342, 495), (306, 425), 6),
    label!(&["29x90", "DK-11201"], (29, 90), FormFactor::DieCut, (342, 1061), (306, 991), 6),
    label!(&["39x90", "DK-11208"], (38, 90), FormFactor::DieCut, (449, 1061), (413, 991), 12),
    label!(&["39x48"], (39, 48), FormFactor::DieCut, (461, 565), (425, 495), 6),
    label!(&["52x29"], (52, 29), FormFactor::DieCut, (614, 341), (578, 271), 0),
    label!(&["54x29"], (54, 29), FormFactor::DieCut, (630, 341), (598, 271), 60),
    label!(&["60x86", "DK-11234", "DK-12343PK"], (60, 87), FormFactor::DieCut, (708, 1024), (672, 954), 18),
    label!(&["62x29", "DK-11209"], (62, 29), FormFactor::DieCut, (732, 341), (696, 271), 12),
    label!(&["62x100", "DK-11202"], (62, 100), FormFactor::DieCut, (732, 1179), (696, 1109), 12),
    label!(&["d12", "DK-11219"], (12, 12), FormFactor::RoundDieCut, (142, 142), (94, 94), 113, feed = 35),
    label!(&["d24", "DK-11218"], (24, 24), FormFactor::RoundDieCut, (284, 284), (236, 236), 42),
    label!(&["d58", "DK-11207"], (58, 58), FormFactor::RoundDieCut, (688, 688), (618, 618), 51),
];

/// Additional labels accepted by `QL10` models, on top of [`LABELS_QL`].
pub static LABELS_QL10_EXTRA: &[Label] = &[
    label!(&["102", "DK-22243"], (102, 0), FormFactor::Endless, (1200, 0), (1164, 0), 12, feed = 35),
    label!(&["104"], (104, 0), FormFactor::Endless, (1227, 0), (1200, 0), -8, feed = 35),
    label!(&["102x51", "DK-11240"], (102, 51), FormFactor::DieCut, (1200, 596), (1164, 526), 12),
    label!(&["102x152", "DK-11241"], (102, 153), FormFactor::DieCut, (1200, 1804), (1164, 1660), 12),
];

/// Additional labels accepted by `QL11` models, on top of [`LABELS_QL`] and [`LABELS_QL10_EXTRA`].
pub static LABELS_QL11_EXTRA: &[Label] = &[
    label!(&["103", "DK-22246"], (104, 0), FormFactor::Endless, (1224, 0), (1200, 0), 12, feed = 35),
    label!(&["103x164", "DK-11247"], (104, 164), FormFactor::DieCut, (1224, 1941), (1200, 1822), 12),
];

/// Labels accepted by `PT` series models.
pub static LABELS_PT: &[Label] = &[
    label!(&["12", "pt12"], (12, 0), FormFactor::PtouchEndless, (170, 0), (150, 0), 213, feed = 14),
    label!(&["18", "pt18"], (18, 0), FormFactor::PtouchEndless, (256, 0), (234, 0), 171, feed = 14),
    label!(&["24", "pt24"], (24, 0), FormFactor::PtouchEndless, (128, 0), (128, 0), 0, feed = 14),
    label!(&["36", "pt36"], (36, 0), FormFactor::PtouchEndless, (512, 0), (454, 0), 61, feed = 14),
];

/// Labels accepted by `PTE` series models.
pub static LABELS_PTE: &[Label] = &[
    label!(&["6", "pte6"], (6, 0), FormFactor::PtouchEndless, (42, 0), (32, 0), 48, feed = 14),
    label!(&["9", "pte9"], (9, 0), FormFactor::PtouchEndless, (64, 0), (50, 0), 39, feed = 14),
    label!(&["12", "pte12"], (12, 0), FormFactor::PtouchEndless, (84, 0), (70, 0), 29, feed = 14),
    label!(&["18", "pte18"], (18, 0), FormFactor::PtouchEndless, (128, 0), (112, 0), 8, feed = 14),
    label!(&["24", "pte24"], (24, 0), FormFactor::PtouchEndless, (170, 0), (128, 0), 0, feed = 14),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_label_tables_satisfy_invariants() {
        for table in [
            LABELS_QL,
            LABELS_QL10_EXTRA,
            LABELS_QL11_EXTRA,
            LABELS_PT,
            LABELS_PTE,
        ] {
            for label in table {
                label.validate().unwrap();
            }
        }
    }
}
