use calamine::{Data, Range};

/// Render a worksheet cell as the string the validators work on.
///
/// Strings are trimmed. Integral floats lose their decimal part, since
/// spreadsheet applications store long identifiers such as SIRETs as floats.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_owned(),
        Data::Float(f) => float_to_string(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(true) => "TRUE".to_owned(),
        Data::Bool(false) => "FALSE".to_owned(),
        other => other.to_string().trim().to_owned(),
    }
}

fn float_to_string(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e17 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

/// Split a `companyTypes` cell on commas, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Flatten a worksheet range into string rows anchored at cell `A1`.
///
/// calamine ranges start at the first used cell, so positions are read
/// absolutely: row `n` of the result is worksheet row `n + 1` whatever the
/// range origin. Only the first `width` columns are kept.
pub fn grid_from_range(range: &Range<Data>, width: usize) -> Vec<Vec<String>> {
    let Some((last_row, _)) = range.end() else {
        return Vec::new();
    };
    (0..=last_row)
        .map(|row| {
            (0..width)
                .map(|col| {
                    range
                        .get_value((row, col as u32))
                        .map(cell_to_string)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}
