use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Target format of a single export operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ExportFormat {
    /// Verilog netlist (needs the gate library)
    Verilog,

    /// Scalable vector graphics
    Svg,

    /// Raster image
    Png,

    /// Fixed-layout document
    Pdf,

    /// Encapsulated PostScript
    Eps,

    /// PostScript
    Ps,
}

impl ExportFormat {
    /// Every format, in the order the host documents them
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Verilog,
        ExportFormat::Svg,
        ExportFormat::Png,
        ExportFormat::Pdf,
        ExportFormat::Eps,
        ExportFormat::Ps,
    ];

    /// Canonical lowercase name, as used in manifests and on the CLI
    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Verilog => "verilog",
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Eps => "eps",
            ExportFormat::Ps => "ps",
        }
    }

    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Verilog => "v",
            other => other.name(),
        }
    }

    /// Name of the host script function performing this export
    pub fn command(self) -> &'static str {
        match self {
            ExportFormat::Verilog => "exportCircuitVerilog",
            ExportFormat::Svg => "exportSvg",
            ExportFormat::Png => "exportPng",
            ExportFormat::Pdf => "exportPdf",
            ExportFormat::Eps => "exportEps",
            ExportFormat::Ps => "exportPs",
        }
    }

    /// Look up a format by its host script function name
    pub fn from_command(command: &str) -> Option<Self> {
        if command == "exportVerilog" {
            return Some(ExportFormat::Verilog);
        }
        Self::ALL.into_iter().find(|f| f.command() == command)
    }

    /// Look up a format by file extension (with or without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Whether the export reads the gate library settings
    pub fn uses_gate_library(self) -> bool {
        matches!(self, ExportFormat::Verilog)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportFormat::Verilog => "Verilog",
            ExportFormat::Svg => "SVG",
            ExportFormat::Png => "PNG",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Eps => "EPS",
            ExportFormat::Ps => "PS",
        };
        f.write_str(label)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .or_else(|| Self::from_extension(&lower))
            .or_else(|| Self::from_command(s.trim()))
            .ok_or_else(|| format!("unknown export format `{}`", s))
    }
}

impl TryFrom<String> for ExportFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
