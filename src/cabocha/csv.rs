//! Feature-column CSV handling. UniDic quotes fields that contain commas
//! (the orth of `，` for instance).

use csv_core::{ReadFieldResult, ReaderBuilder};

/// Splits one feature CSV row into fields.
pub fn parse_csv_row(row: &str) -> Vec<String> {
    parse_delimited_row(row, b',')
}

/// Splits one row on `delimiter`, honouring double quotes.
pub fn parse_delimited_row(row: &str, delimiter: u8) -> Vec<String> {
    let mut features = vec![];
    let mut rdr = ReaderBuilder::new().delimiter(delimiter).build();
    let mut bytes = row.as_bytes();
    let mut output = vec![0; row.len().max(64)];
    let mut field = Vec::new();
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        field.extend_from_slice(&output[..nout]);
        bytes = &bytes[nin..];
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::OutputFull => continue,
            ReadFieldResult::Field { record_end } => record_end,
            ReadFieldResult::End => true,
        };
        features.push(String::from_utf8_lossy(&field).into_owned());
        field.clear();
        if end {
            break;
        }
    }
    features
}

/// Joins fields back into a CSV row, quoting where needed.
pub fn join_csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| {
            let f = f.as_ref();
            if f.contains([',', '"']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
