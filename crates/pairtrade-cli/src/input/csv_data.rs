use pairtrade_core::types::PriceRow;

/// Read a long-format price table (`date,symbol,close`) from a CSV file.
/// Dates must be ISO `YYYY-MM-DD`.
pub fn read_price_rows(path: &str) -> Result<Vec<PriceRow>, Box<dyn std::error::Error>> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| format!("Failed to open '{path}': {e}"))?;

    let mut rows: Vec<PriceRow> = Vec::new();
    for record in reader.deserialize() {
        let row: PriceRow = record.map_err(|e| format!("Failed to parse '{path}': {e}"))?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(format!("No price rows found in '{path}'").into());
    }
    Ok(rows)
}
