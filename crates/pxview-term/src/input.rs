// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key and mouse events. Understands what
// `terminal.rs` turns on plus what every terminal sends anyway:
//
// - Legacy CSI sequences (arrows, editing keys, function keys)
// - SS3 sequences (arrows and F1–F4 in application mode)
// - SGR mouse protocol (press / release / drag / move / scroll)
// - Ctrl+letter as control bytes, Alt+key as ESC-prefixed bytes
// - UTF-8 multi-byte characters
//
// Escape sequences can be split across reads, so the parser buffers
// incomplete input. After a read timeout with nothing new, `flush`
// resolves a lone ESC into the Escape key.

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Whether this is Ctrl+`c` for the given letter.
    #[must_use]
    pub fn is_ctrl(&self, c: char) -> bool {
        self.modifiers.contains(Modifiers::CTRL) && self.code == KeyCode::Char(c)
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F20.
    F(u8),
}

bitflags! {
    /// Keyboard modifier flags, in xterm's `param = 1 + bitmask` encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

/// A mouse event at a 0-indexed cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press(MouseButton),
    Release(MouseButton),
    /// Motion while a button is held.
    Drag(MouseButton),
    /// Motion with no button held.
    Move,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Incremental terminal input parser.
///
/// Feed bytes with [`advance`](Parser::advance); incomplete sequences stay
/// buffered until more bytes arrive or [`flush`](Parser::flush) is called.
pub struct Parser {
    buf: Vec<u8>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    /// Feed raw bytes and return every event that can be parsed so far.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match try_parse(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Are there buffered bytes waiting for more input?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Emit pending bytes as literal keys.
    ///
    /// A lone ESC becomes the Escape key; control bytes become Ctrl+letter.
    pub fn flush(&mut self) -> Vec<Event> {
        let events = self
            .buf
            .iter()
            .filter_map(|&byte| match byte {
                0x1B => Some(press(KeyCode::Escape)),
                0x00 => Some(ctrl_key('@')),
                b @ 0x01..=0x1A => Some(ctrl_key((b + b'a' - 1) as char)),
                0x7F => Some(press(KeyCode::Backspace)),
                b @ 0x20..=0x7E => Some(press(KeyCode::Char(b as char))),
                _ => None,
            })
            .collect();
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

enum Parsed {
    /// An event and how many bytes it consumed.
    Event(Event, usize),
    /// Need more bytes.
    Incomplete,
    /// Unrecognized; skip this many bytes.
    Skip(usize),
}

/// Parse a single event from the start of `buf` (non-empty).
fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        0x00 => Parsed::Event(ctrl_key('@'), 1),
        0x08 | 0x7F => Parsed::Event(press(KeyCode::Backspace), 1),
        0x09 => Parsed::Event(press(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Event(press(KeyCode::Enter), 1),
        b @ 0x01..=0x1A => Parsed::Event(ctrl_key((b + b'a' - 1) as char), 1),
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(b as char)), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        0x1B => Parsed::Event(key_with(KeyCode::Escape, Modifiers::ALT), 2),
        b @ 0x20..=0x7E => Parsed::Event(key_with(KeyCode::Char(b as char), Modifiers::ALT), 2),
        b @ 0x01..=0x1A => Parsed::Event(
            key_with(
                KeyCode::Char((b + b'a' - 1) as char),
                Modifiers::ALT | Modifiers::CTRL,
            ),
            2,
        ),
        _ => Parsed::Event(press(KeyCode::Escape), 1),
    }
}

// ── CSI ─────────────────────────────────────────────────────────────────────

fn parse_csi(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    if buf[2] == b'<' {
        return parse_sgr_mouse(buf);
    }

    // Parameter bytes are 0x30..=0x3F, intermediates 0x20..=0x2F, then one
    // final byte in 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params = parse_params(&buf[2..end]);
    let consumed = end + 1;
    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    let code = if final_byte == b'~' {
        match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            n @ 15..=24 => match tilde_function_key(n) {
                Some(f) => KeyCode::F(f),
                None => return Parsed::Skip(consumed),
            },
            _ => return Parsed::Skip(consumed),
        }
    } else {
        match final_byte {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'Z' => return Parsed::Event(key_with(KeyCode::Tab, Modifiers::SHIFT), consumed),
            _ => return Parsed::Skip(consumed),
        }
    };

    Parsed::Event(key_with(code, modifiers), consumed)
}

/// F5–F12 in the `CSI n ~` encoding (numbering has gaps at 16 and 22).
const fn tilde_function_key(n: u16) -> Option<u8> {
    match n {
        15 => Some(5),
        17 => Some(6),
        18 => Some(7),
        19 => Some(8),
        20 => Some(9),
        21 => Some(10),
        23 => Some(11),
        24 => Some(12),
        _ => None,
    }
}

// ── SS3 ─────────────────────────────────────────────────────────────────────

fn parse_ss3(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match buf[2] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Parsed::Skip(3),
    };

    Parsed::Event(press(code), 3)
}

// ── SGR Mouse ───────────────────────────────────────────────────────────────

fn parse_sgr_mouse(buf: &[u8]) -> Parsed {
    // ESC [ < Pb ; Px ; Py M   (press / motion)
    // ESC [ < Pb ; Px ; Py m   (release)
    let start = 3;
    let mut end = start;
    while end < buf.len() {
        if buf[end] == b'M' || buf[end] == b'm' {
            break;
        }
        if !buf[end].is_ascii_digit() && buf[end] != b';' {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let is_release = buf[end] == b'm';
    let consumed = end + 1;

    let params = parse_params(&buf[start..end]);
    let [cb, raw_x, raw_y] = [0, 1, 2].map(|i| params.get(i).copied().unwrap_or(0));

    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let base = cb & 3;
    let kind = if cb & 64 != 0 {
        match base {
            0 => MouseEventKind::ScrollUp,
            1 => MouseEventKind::ScrollDown,
            // Horizontal scroll is not used by the viewer.
            _ => return Parsed::Skip(consumed),
        }
    } else if cb & 32 != 0 {
        match base {
            0 => MouseEventKind::Drag(MouseButton::Left),
            1 => MouseEventKind::Drag(MouseButton::Middle),
            2 => MouseEventKind::Drag(MouseButton::Right),
            _ => MouseEventKind::Move,
        }
    } else if is_release {
        MouseEventKind::Release(decode_mouse_button(base))
    } else {
        MouseEventKind::Press(decode_mouse_button(base))
    };

    // SGR coordinates are 1-indexed.
    Parsed::Event(
        Event::Mouse(MouseEvent {
            kind,
            x: raw_x.saturating_sub(1),
            y: raw_y.saturating_sub(1),
            modifiers,
        }),
        consumed,
    )
}

// ── UTF-8 ───────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Parsed::Skip(1),
    };
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            Parsed::Event(press(KeyCode::Char(ch)), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn press(code: KeyCode) -> Event {
    key_with(code, Modifiers::empty())
}

const fn ctrl_key(c: char) -> Event {
    key_with(KeyCode::Char(c), Modifiers::CTRL)
}

const fn key_with(code: KeyCode, modifiers: Modifiers) -> Event {
    Event::Key(KeyEvent { code, modifiers })
}

/// Parse `;`-separated decimal parameters. Empty fields read as 0.
fn parse_params(raw: &[u8]) -> Vec<u16> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == b';')
        .map(|field| {
            field
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, &b| {
                    acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
                })
        })
        .collect()
}

/// Decode an xterm modifier parameter (`1 + bitmask`).
#[allow(clippy::cast_possible_truncation)] // Only the low bits carry flags.
const fn decode_modifiers(param: u16) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    Modifiers::from_bits_truncate(val as u8)
}

const fn decode_mouse_button(base: u16) -> MouseButton {
    match base {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        _ => MouseButton::Right,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(bytes: &[u8]) -> Vec<Event> {
        Parser::new().advance(bytes)
    }

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            x,
            y,
            modifiers: Modifiers::empty(),
        })
    }

    // ── Keys ────────────────────────────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(parse(b"q"), vec![press(KeyCode::Char('q'))]);
    }

    #[test]
    fn ctrl_c_is_control_byte() {
        let events = parse(&[0x03]);
        assert_eq!(events, vec![ctrl_key('c')]);
        let Event::Key(key) = events[0] else {
            panic!("expected key");
        };
        assert!(key.is_ctrl('c'));
    }

    #[test]
    fn enter_tab_backspace() {
        assert_eq!(
            parse(b"\r\t\x7f"),
            vec![
                press(KeyCode::Enter),
                press(KeyCode::Tab),
                press(KeyCode::Backspace)
            ]
        );
    }

    #[test]
    fn arrows_csi() {
        assert_eq!(
            parse(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                press(KeyCode::Up),
                press(KeyCode::Down),
                press(KeyCode::Right),
                press(KeyCode::Left)
            ]
        );
    }

    #[test]
    fn arrows_ss3() {
        assert_eq!(parse(b"\x1bOA"), vec![press(KeyCode::Up)]);
    }

    #[test]
    fn shift_arrow_modifier() {
        assert_eq!(
            parse(b"\x1b[1;2C"),
            vec![key_with(KeyCode::Right, Modifiers::SHIFT)]
        );
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(parse(b"\x1b[5~"), vec![press(KeyCode::PageUp)]);
        assert_eq!(parse(b"\x1b[3~"), vec![press(KeyCode::Delete)]);
        assert_eq!(parse(b"\x1b[24~"), vec![press(KeyCode::F(12))]);
    }

    #[test]
    fn unknown_tilde_is_skipped() {
        assert_eq!(parse(b"\x1b[16~x"), vec![press(KeyCode::Char('x'))]);
    }

    #[test]
    fn alt_letter() {
        assert_eq!(
            parse(b"\x1bx"),
            vec![key_with(KeyCode::Char('x'), Modifiers::ALT)]
        );
    }

    #[test]
    fn utf8_character() {
        assert_eq!(parse("é".as_bytes()), vec![press(KeyCode::Char('é'))]);
    }

    // ── Incomplete input ────────────────────────────────────────────────

    #[test]
    fn split_sequence_completes_later() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b[").is_empty());
        assert!(p.has_pending());
        assert_eq!(p.advance(b"A"), vec![press(KeyCode::Up)]);
        assert!(!p.has_pending());
    }

    #[test]
    fn lone_escape_flushes_as_escape() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b").is_empty());
        assert_eq!(p.flush(), vec![press(KeyCode::Escape)]);
        assert!(!p.has_pending());
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn mouse_left_press_is_zero_based() {
        assert_eq!(
            parse(b"\x1b[<0;10;5M"),
            vec![mouse(MouseEventKind::Press(MouseButton::Left), 9, 4)]
        );
    }

    #[test]
    fn mouse_release() {
        assert_eq!(
            parse(b"\x1b[<0;1;1m"),
            vec![mouse(MouseEventKind::Release(MouseButton::Left), 0, 0)]
        );
    }

    #[test]
    fn mouse_left_drag() {
        assert_eq!(
            parse(b"\x1b[<32;20;7M"),
            vec![mouse(MouseEventKind::Drag(MouseButton::Left), 19, 6)]
        );
    }

    #[test]
    fn mouse_motion_without_button() {
        assert_eq!(
            parse(b"\x1b[<35;2;2M"),
            vec![mouse(MouseEventKind::Move, 1, 1)]
        );
    }

    #[test]
    fn mouse_scroll() {
        assert_eq!(
            parse(b"\x1b[<65;3;3M"),
            vec![mouse(MouseEventKind::ScrollDown, 2, 2)]
        );
    }

    #[test]
    fn mouse_ctrl_modifier() {
        let events = parse(b"\x1b[<16;1;1M");
        let Event::Mouse(m) = events[0] else {
            panic!("expected mouse event");
        };
        assert!(m.modifiers.contains(Modifiers::CTRL));
        assert_eq!(m.kind, MouseEventKind::Press(MouseButton::Left));
    }

    #[test]
    fn mouse_split_across_reads() {
        let mut p = Parser::new();
        assert!(p.advance(b"\x1b[<0;4").is_empty());
        assert_eq!(
            p.advance(b";2M"),
            vec![mouse(MouseEventKind::Press(MouseButton::Left), 3, 1)]
        );
    }

    // ── Params ──────────────────────────────────────────────────────────

    #[test]
    fn params_with_empty_fields() {
        assert_eq!(parse_params(b"1;;3"), vec![1, 0, 3]);
        assert!(parse_params(b"").is_empty());
    }
}
