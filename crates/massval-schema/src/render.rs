use crate::SchemaError;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Render a header and records as CSV.
///
/// Every field is quoted so that list values such as `PRODUCER,TRANSPORTER`
/// survive the comma separator. Lines end with `\n`.
pub fn csv_document<I, R, S>(header: &[&str], records: I) -> Result<String, SchemaError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for record in records {
        writer.write_record(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SchemaError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_field() {
        let out = csv_document(&["siret", "role"], [vec!["123", "ADMIN"]]).unwrap();
        assert_eq!(out, "\"siret\",\"role\"\n\"123\",\"ADMIN\"\n");
    }

    #[test]
    fn escapes_embedded_quotes_and_keeps_commas() {
        let out = csv_document(&["a"], [vec!["say \"hi\", then go"]]).unwrap();
        assert_eq!(out, "\"a\"\n\"say \"\"hi\"\", then go\"\n");
    }

    #[test]
    fn header_only_when_no_records() {
        let records: Vec<Vec<String>> = Vec::new();
        let out = csv_document(&["siret", "email", "role"], records).unwrap();
        assert_eq!(out, "\"siret\",\"email\",\"role\"\n");
    }
}
