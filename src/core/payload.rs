//! Print payload construction.
//! Turns simple text markup into the byte stream a thermal receipt printer
//! expects: stripped text plus a small fixed subset of ESC/POS control codes.

use regex::Regex;

/// Line feeds appended after the text so the printed tail clears the tear bar.
const TRAILING_FEED: &str = "\n\n\n";

/// Maps `<br>` variants to newlines and removes every other tag.
/// Idempotent on text that contains no markup.
pub fn strip_markup(input: &str) -> String {
    let line_breaks = Regex::new(r"(?i)<br\s*/?>").unwrap();
    let tags = Regex::new(r"</?[^>]+(>|$)").unwrap();

    let with_newlines = line_breaks.replace_all(input, "\n");
    tags.replace_all(&with_newlines, "").into_owned()
}

/// Renders markup into the final payload bytes: stripped text, trailing
/// feed, UTF-8 encoded.
pub fn render_markup(markup: &str) -> Vec<u8> {
    let mut text = strip_markup(markup);
    text.push_str(TRAILING_FEED);
    text.into_bytes()
}

/// Renders already-plain text into payload bytes with the trailing feed.
pub fn render_plain_text(text: &str) -> Vec<u8> {
    let mut text = text.to_string();
    text.push_str(TRAILING_FEED);
    text.into_bytes()
}

/// Text alignment on the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    fn code(self) -> u8 {
        match self {
            Alignment::Left => 0x00,
            Alignment::Center => 0x01,
            Alignment::Right => 0x02,
        }
    }
}

/// ESC/POS control sequences the bridge emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterCommand {
    /// Reset the printer to its power-on state (ESC @)
    Initialize,
    /// Emphasized mode on (ESC E 1)
    BoldOn,
    /// Emphasized mode off (ESC E 0)
    BoldOff,
    /// Justification for following text (ESC a n)
    Align(Alignment),
    /// Print buffered line and advance (LF)
    LineFeed,
    /// Feed n lines (ESC d n)
    Feed(u8),
    /// Partial paper cut (GS V 1)
    PartialCut,
}

impl PrinterCommand {
    /// Convert the command to its byte representation
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Initialize => vec![0x1b, 0x40],
            Self::BoldOn => vec![0x1b, 0x45, 0x01],
            Self::BoldOff => vec![0x1b, 0x45, 0x00],
            Self::Align(alignment) => vec![0x1b, 0x61, alignment.code()],
            Self::LineFeed => vec![0x0a],
            Self::Feed(lines) => vec![0x1b, 0x64, *lines],
            Self::PartialCut => vec![0x1d, 0x56, 0x01],
        }
    }
}

/// Composes a receipt payload from text segments wrapped in control codes.
/// The buffer always starts with an initialize sequence.
#[derive(Debug)]
pub struct ReceiptBuilder {
    buf: Vec<u8>,
}

impl ReceiptBuilder {
    pub fn new() -> Self {
        Self {
            buf: PrinterCommand::Initialize.to_bytes(),
        }
    }

    pub fn command(mut self, command: PrinterCommand) -> Self {
        self.buf.extend_from_slice(&command.to_bytes());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.buf.extend_from_slice(text.as_bytes());
        self
    }

    /// Text wrapped in bold on/off sequences.
    pub fn bold_text(self, text: &str) -> Self {
        self.command(PrinterCommand::BoldOn)
            .text(text)
            .command(PrinterCommand::BoldOff)
    }

    pub fn align(self, alignment: Alignment) -> Self {
        self.command(PrinterCommand::Align(alignment))
    }

    pub fn line_feed(self) -> Self {
        self.command(PrinterCommand::LineFeed)
    }

    pub fn feed(self, lines: u8) -> Self {
        self.command(PrinterCommand::Feed(lines))
    }

    pub fn cut(self) -> Self {
        self.command(PrinterCommand::PartialCut)
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for ReceiptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_and_line_breaks_mapped() {
        assert_eq!(strip_markup("<b>Hi</b><br>Bye"), "Hi\nBye");
        assert_eq!(strip_markup("a<br/>b<BR />c"), "a\nb\nc");
    }

    #[test]
    fn stripping_is_idempotent_on_plain_text() {
        let plain = "Hi\nBye";
        assert_eq!(strip_markup(plain), plain);
        assert_eq!(strip_markup(&strip_markup(plain)), plain);
    }

    #[test]
    fn render_markup_matches_the_documented_example() {
        assert_eq!(render_markup("<b>Hi</b><br>Bye"), b"Hi\nBye\n\n\n".to_vec());
    }

    #[test]
    fn rendering_is_deterministic() {
        let markup = "<b>Hello Printer</b><br>Second line";
        assert_eq!(render_markup(markup), render_markup(markup));
    }

    #[test]
    fn plain_text_keeps_angle_brackets() {
        assert_eq!(render_plain_text("1 < 2"), b"1 < 2\n\n\n".to_vec());
    }

    #[test]
    fn command_byte_sequences() {
        assert_eq!(PrinterCommand::Initialize.to_bytes(), vec![0x1b, 0x40]);
        assert_eq!(PrinterCommand::BoldOn.to_bytes(), vec![0x1b, 0x45, 0x01]);
        assert_eq!(PrinterCommand::BoldOff.to_bytes(), vec![0x1b, 0x45, 0x00]);
        assert_eq!(
            PrinterCommand::Align(Alignment::Center).to_bytes(),
            vec![0x1b, 0x61, 0x01]
        );
        assert_eq!(PrinterCommand::PartialCut.to_bytes(), vec![0x1d, 0x56, 0x01]);
    }

    #[test]
    fn builder_wraps_bold_text_in_control_codes() {
        let payload = ReceiptBuilder::new()
            .align(Alignment::Center)
            .bold_text("TOTAL")
            .line_feed()
            .feed(3)
            .cut()
            .build();

        let mut expected = vec![0x1b, 0x40]; // initialize
        expected.extend_from_slice(&[0x1b, 0x61, 0x01]);
        expected.extend_from_slice(&[0x1b, 0x45, 0x01]);
        expected.extend_from_slice(b"TOTAL");
        expected.extend_from_slice(&[0x1b, 0x45, 0x00]);
        expected.push(0x0a);
        expected.extend_from_slice(&[0x1b, 0x64, 0x03]);
        expected.extend_from_slice(&[0x1d, 0x56, 0x01]);
        assert_eq!(payload, expected);
    }
}
