//! Payloads for diagnostic test prints

/// ESC @: Initialize printer
pub const INIT: &str = "\x1b@";
/// Feed six lines, then GS V 0: full cut
pub const CUT: &str = "\n\n\n\n\n\n\x1dV\x00";
/// ESC ! 0x38: double height, double width, emphasized
pub const BANNER_STYLE: &str = "\x1b!\x38";
/// ESC ! 0x00: back to font A
pub const FONT_A: &str = "\x1b!\x00";

/// Builds a calibration print as text; the dispatcher transcodes it
pub struct CalibrationBuilder {
    buffer: String,
}

impl CalibrationBuilder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn initialize(mut self) -> Self {
        self.buffer.push_str(INIT);
        self
    }

    pub fn banner_style(mut self) -> Self {
        self.buffer.push_str(BANNER_STYLE);
        self
    }

    pub fn font_a(mut self) -> Self {
        self.buffer.push_str(FONT_A);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.buffer.push_str(text);
        self
    }

    pub fn text_line(mut self, text: &str) -> Self {
        self.buffer.push_str(text);
        self.buffer.push_str("\r\n");
        self
    }

    pub fn cut(mut self) -> Self {
        self.buffer.push_str(CUT);
        self
    }

    pub fn build(self) -> String {
        self.buffer
    }
}

impl Default for CalibrationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Full character test: every printable character the transcoder knows about
pub fn character_test(calibration_characters: &str) -> String {
    CalibrationBuilder::new()
        .initialize()
        .text(calibration_characters)
        .cut()
        .build()
}

/// Short identification print: banner, printer name and device
pub fn banner_test(banner: &str, name: &str, device: &str) -> String {
    CalibrationBuilder::new()
        .initialize()
        .banner_style()
        .text_line(banner)
        .font_a()
        .text_line(name)
        .text(device)
        .cut()
        .build()
}
