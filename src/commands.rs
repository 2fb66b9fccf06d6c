//! Raster command (opcode) encoding.
//!
//! One `RasterCommand` variant per opcode in the Brother raster protocol;
//! `From<RasterCommand> for Vec<u8>` is the only place that knows the wire
//! layout. [`CommandBuilder`] concatenates a sequence of commands into the
//! final byte stream for a job.

use crate::catalog::{FormFactor, Label, Model};

pub(crate) enum DynamicCommandMode {
    Raster,
}

pub(crate) enum ColorPower {
    LowEnergy,
    HighEnergy,
}

/// Various mode settings (opcode `1B 69 4D`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct VariousModeSettings {
    pub auto_cut: bool,
}

impl TryFrom<u8> for VariousModeSettings {
    type Error = crate::error::StatusParsingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(VariousModeSettings {
            auto_cut: value & 0b0100_0000 != 0,
        })
    }
}

pub(crate) enum RasterCommand {
    /// NUL preamble. Byte count is model-dependent (200 for most QL models, 400 for two-color QL-8xx).
    Invalidate { num_bytes: u32 },
    Initialize,
    SpecifyMarginAmount {
        margin_size: u16,
    },
    SwitchDynamicCommandMode {
        command_mode: DynamicCommandMode,
    },
    /// Requests an immediate status reply (`1B 69 53`).
    StatusInformationRequest,
    RasterGraphicsTransfer {
        data: Vec<u8>,
    },
    TwoColorRasterGraphicsTransfer {
        data: Vec<u8>,
        color_power: ColorPower,
    },
    Print,
    PrintWithFeed,
    SelectCompressionMode {
        tiff_compression: bool,
    },
    SpecifyPageNumber {
        cut_every: u8,
    },
    VariousMode(VariousModeSettings),
    ExpandedMode {
        two_color: bool,
        cut_at_end: bool,
        high_dpi: bool,
    },
    PrintInformation {
        model: &'static Model,
        label: &'static Label,
        quality_priority: bool,
        recovery_on: bool,
        no_lines: u32,
        first_page: bool,
    },
}

impl From<RasterCommand> for Vec<u8> {
    fn from(value: RasterCommand) -> Self {
        use RasterCommand::{
            ExpandedMode, Initialize, Invalidate, Print, PrintInformation, PrintWithFeed,
            RasterGraphicsTransfer, SelectCompressionMode, SpecifyMarginAmount, SpecifyPageNumber,
            StatusInformationRequest, SwitchDynamicCommandMode,
            TwoColorRasterGraphicsTransfer, VariousMode,
        };
        match value {
            Invalidate { num_bytes } => vec![0u8; num_bytes as usize],
            Initialize => vec![0x1b, 0x40],
            SpecifyMarginAmount { margin_size } => {
                let [n1, n2] = margin_size.to_le_bytes();
                vec![0x1b, 0x69, 0x64, n1, n2]
            }
            SwitchDynamicCommandMode { command_mode } => {
                let m = match command_mode {
                    DynamicCommandMode::Raster => 0x01,
                };
                vec![0x1b, 0x69, 0x61, m]
            }
            StatusInformationRequest => vec![0x1b, 0x69, 0x53],
            RasterGraphicsTransfer { mut data } => {
                let [n1, n2] = (data.len() as u16).to_le_bytes();
                let mut res = vec![0x67, n1, n2];
                res.append(&mut data);
                res
            }
            TwoColorRasterGraphicsTransfer { mut data, color_power } => {
                let cp = match color_power {
                    ColorPower::HighEnergy => 0x01,
                    ColorPower::LowEnergy => 0x02,
                };
                let [n1, n2] = (data.len() as u16).to_le_bytes();
                let mut res = vec![0x77, cp, n1, n2];
                res.append(&mut data);
                res
            }
            Print => vec![0x0c],
            PrintWithFeed => vec![0x1a],
            SelectCompressionMode { tiff_compression } => {
                let cm = if tiff_compression { 0x02 } else { 0x00 };
                vec![0x4d, cm]
            }
            SpecifyPageNumber { cut_every } => vec![0x1b, 0x69, 0x41, cut_every],
            VariousMode(settings) => {
                let ac = if settings.auto_cut { 0b0100_0000 } else { 0x00 };
                vec![0x1b, 0x69, 0x4d, ac]
            }
            ExpandedMode { two_color, cut_at_end, high_dpi } => {
                let mut flags = 0x00;
                if two_color {
                    flags |= 0b1;
                }
                if cut_at_end {
                    flags |= 0b1 << 3;
                }
                if high_dpi {
                    flags |= 0b1 << 6;
                }
                vec![0x1b, 0x69, 0x4b, flags]
            }
            PrintInformation {
                model,
                label,
                quality_priority,
                recovery_on,
                no_lines,
                first_page,
            } => {
                let mut valid_flag = 0x06;
                let media_width = label.tape_size_mm.0 as u8;
                let mut media_length = 0x00;
                let media_type = match label.form_factor {
                    FormFactor::DieCut | FormFactor::RoundDieCut => {
                        media_length = label.tape_size_mm.1 as u8;
                        valid_flag |= 0x8;
                        0x0b
                    }
                    FormFactor::Endless => 0x0a,
                    FormFactor::PtouchEndless => 0x00,
                };
                let _ = model;
                if quality_priority {
                    valid_flag |= 0x40;
                }
                if recovery_on {
                    valid_flag |= 0x80;
                }
                let [n8, n7, n6, n5] = no_lines.to_be_bytes();
                let first_page = if first_page { 0x00 } else { 0x01 };
                vec![
                    0x1b, 0x69, 0x7a, valid_flag, media_type, media_width, media_length, n5, n6, n7, n8,
                    first_page, 0x00,
                ]
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct CommandBuilder {
    commands: Vec<Vec<u8>>,
}

impl CommandBuilder {
    pub fn add(&mut self, cmd: RasterCommand) {
        self.commands.push(cmd.into());
    }

    pub fn build(self) -> Vec<u8> {
        self.commands.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_emits_requested_byte_count() {
        let bytes: Vec<u8> = RasterCommand::Invalidate { num_bytes: 400 }.into();
        assert_eq!(bytes.len(), 400);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn raster_transfer_uses_two_byte_little_endian_length() {
        let data = vec![0u8; 90];
        let bytes: Vec<u8> = RasterCommand::RasterGraphicsTransfer { data: data.clone() }.into();
        assert_eq!(&bytes[0..3], &[0x67, 90, 0x00]);
        assert_eq!(&bytes[3..], data.as_slice());
    }

    #[test]
    fn status_information_request_is_three_bytes() {
        let bytes: Vec<u8> = RasterCommand::StatusInformationRequest.into();
        assert_eq!(bytes, vec![0x1b, 0x69, 0x53]);
    }
}
