//! Number and string rendering for the text exposition format.
//!
//! Values are rendered the way the reference client library does it, so a
//! document rebuilt from the shared store is byte-identical to one produced by
//! a single in-process registry: shortest round-trip digits, always a
//! fractional part (`3.0`), and Go-style exponents for large positive values
//! (`1.5494443264298077e+09`).

/// Render a sample value or bucket bound.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }
    let s = shortest_repr(v);
    // Go switches to exponents sooner; only positive values matter for le.
    // The exponent is written as `e+0` plus the digit count, unpadded, so
    // 1e10..1e16 render as `e+010`..`e+015` like the reference client.
    if v > 0.0 {
        if let Some(dot) = s.find('.') {
            if dot > 6 {
                let mantissa = format!("{}.{}{}", &s[..1], &s[1..dot], &s[dot + 1..]);
                let mantissa = mantissa.trim_end_matches(&['0', '.'][..]);
                return format!("{mantissa}e+0{}", dot - 1);
            }
        }
    }
    s
}

/// Shortest round-trip decimal with a mandatory fractional part in fixed
/// notation, scientific with a signed two-digit exponent outside `1e-4..1e16`.
fn shortest_repr(v: f64) -> String {
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0".into() } else { "0.0".into() };
    }
    // `{:e}` yields the shortest digits that round-trip, e.g. "-1.25e-7".
    let sci = format!("{v:e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                format!("{sign}{digits}{}.0", "0".repeat(int_len - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
            }
        } else {
            let zeros = "0".repeat((-exp - 1) as usize);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let m = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        let esign = if exp < 0 { '-' } else { '+' };
        format!("{sign}{m}e{esign}{:02}", exp.abs())
    }
}

/// Escape a label value for use inside `name="..."`.
pub fn escape_label_value(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n").replace('"', "\\\"")
}

/// Escape HELP text.
pub fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}
