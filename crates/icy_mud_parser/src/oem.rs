// CP437 glyphs used when emulating a DOS terminal.

const CONTROL_GLYPHS: [char; 32] = [
    ' ', '☺', '☻', '♥', '♦', '♣', '♠', '•', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼', '►', '◄', '↕', '‼', '¶', '§', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲', '▼',
];

const HIGH_GLYPHS: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Glyph for a control code (0-31, 127) on a DOS screen.
pub fn control_glyph(ch: char) -> Option<char> {
    match ch as u32 {
        0x7F => Some('⌂'),
        c @ 0x01..=0x1F => Some(CONTROL_GLYPHS[c as usize]),
        _ => None,
    }
}

/// Maps 128-254 through CP437, other characters pass through.
pub fn high_glyph(ch: char) -> char {
    match ch as u32 {
        c @ 0x80..=0xFE => HIGH_GLYPHS[(c - 0x80) as usize],
        _ => ch,
    }
}

/// Unicode control picture (U+2400 block) for a control code.
pub fn control_picture(ch: char) -> Option<char> {
    match ch as u32 {
        0x7F => Some('\u{2421}'),
        c @ 0x00..=0x1F => char::from_u32(0x2400 + c),
        _ => None,
    }
}
