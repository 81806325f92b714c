//! Locale-independent C-style float literal parsing.
//!
//! Implements the prefix grammar `[ws] [sign] (decimal | 0x hex [p exp])`
//! with the same tolerance as `strtod`: trailing garbage is ignored, and an
//! empty or entirely non-numeric input yields `0.0`. The grammar is frozen
//! here rather than delegated to the platform C library, which is
//! locale-dependent.

/// Parses the longest numeric prefix of `bytes` as an `f64`.
///
/// Returns `0.0` when no numeric prefix exists. The word spellings the C
/// library accepts (`inf`, `nan`) are deliberately NOT part of this grammar;
/// the caller handles the format's special literals before falling through
/// to this parser.
pub fn parse_f64(bytes: &[u8]) -> f64 {
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let mut negative = false;
    match bytes.get(pos) {
        Some(b'-') => {
            negative = true;
            pos += 1;
        }
        Some(b'+') => pos += 1,
        _ => {}
    }

    let magnitude = if bytes[pos..].len() >= 2
        && bytes[pos] == b'0'
        && (bytes[pos + 1] == b'x' || bytes[pos + 1] == b'X')
        && has_hex_mantissa(&bytes[pos + 2..])
    {
        parse_hex_magnitude(&bytes[pos + 2..])
    } else {
        parse_dec_magnitude(&bytes[pos..])
    };

    match magnitude {
        Some(value) if negative => -value,
        Some(value) => value,
        None => 0.0,
    }
}

/// True if a hexadecimal mantissa ("h", "h.h", ".h") starts here.
fn has_hex_mantissa(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(b) if b.is_ascii_hexdigit() => true,
        Some(b'.') => matches!(bytes.get(1), Some(b) if b.is_ascii_hexdigit()),
        _ => false,
    }
}

fn parse_dec_magnitude(bytes: &[u8]) -> Option<f64> {
    let mut pos = 0;
    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = &bytes[int_start..pos];

    let mut frac_digits: &[u8] = b"";
    if bytes.get(pos) == Some(&b'.') {
        let frac_start = pos + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        // The dot is part of the number only when a digit adjoins it.
        if !int_digits.is_empty() || end > frac_start {
            frac_digits = &bytes[frac_start..end];
            pos = end;
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exp_digits: &[u8] = b"";
    let mut exp_negative = false;
    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut cursor = pos + 1;
        let mut neg = false;
        match bytes.get(cursor) {
            Some(b'-') => {
                neg = true;
                cursor += 1;
            }
            Some(b'+') => cursor += 1,
            _ => {}
        }
        let exp_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        // The exponent marker is consumed only when digits follow it.
        if cursor > exp_start {
            exp_digits = &bytes[exp_start..cursor];
            exp_negative = neg;
        }
    }

    // Compose a normalized literal and let the standard float parser do the
    // correctly-rounded decimal-to-binary conversion.
    let mut literal = String::with_capacity(int_digits.len() + frac_digits.len() + exp_digits.len() + 8);
    push_ascii(&mut literal, if int_digits.is_empty() { b"0" } else { int_digits });
    literal.push('.');
    push_ascii(&mut literal, if frac_digits.is_empty() { b"0" } else { frac_digits });
    if !exp_digits.is_empty() {
        literal.push('e');
        if exp_negative {
            literal.push('-');
        }
        push_ascii(&mut literal, exp_digits);
    }
    literal.parse::<f64>().ok()
}

fn parse_hex_magnitude(bytes: &[u8]) -> Option<f64> {
    let mut pos = 0;
    let mut value = 0.0f64;

    while pos < bytes.len() && bytes[pos].is_ascii_hexdigit() {
        value = value * 16.0 + hex_digit(bytes[pos]);
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let mut scale = 1.0 / 16.0;
        while pos < bytes.len() && bytes[pos].is_ascii_hexdigit() {
            value += hex_digit(bytes[pos]) * scale;
            scale /= 16.0;
            pos += 1;
        }
    }

    if matches!(bytes.get(pos), Some(b'p') | Some(b'P')) {
        let mut cursor = pos + 1;
        let mut negative = false;
        match bytes.get(cursor) {
            Some(b'-') => {
                negative = true;
                cursor += 1;
            }
            Some(b'+') => cursor += 1,
            _ => {}
        }
        let exp_start = cursor;
        let mut exponent: i32 = 0;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            exponent = exponent
                .saturating_mul(10)
                .saturating_add(i32::from(bytes[cursor] - b'0'));
            cursor += 1;
        }
        // A binary exponent needs at least one digit; otherwise the `p` is
        // trailing garbage and the mantissa alone is the value.
        if cursor > exp_start {
            if negative {
                exponent = -exponent;
            }
            value *= 2.0f64.powi(exponent.clamp(-2000, 2000));
        }
    }

    Some(value)
}

fn hex_digit(byte: u8) -> f64 {
    f64::from((byte as char).to_digit(16).unwrap_or(0))
}

fn push_ascii(out: &mut String, bytes: &[u8]) {
    for &b in bytes {
        out.push(b as char);
    }
}
