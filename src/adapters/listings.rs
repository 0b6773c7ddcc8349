//! Listings CSV decoding.
//!
//! The published listings file is Latin-1 encoded; bytes map one-to-one
//! onto Unicode code points so the decode is a plain widening. Column
//! positions are resolved once against the configured field mapping and a
//! missing column fails fast with SchemaMismatch. Cell-level problems
//! (blank or unparseable numerics) become `None` and are handled by the
//! pipeline's filter step, matching the nullable-price data model.

use crate::config::sources::ListingFields;
use crate::domain::model::ListingRecord;
use crate::utils::error::{MapError, Result};

pub fn parse_listings(bytes: &[u8], fields: &ListingFields) -> Result<Vec<ListingRecord>> {
    let text = decode_latin1(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| MapError::SchemaMismatch {
                dataset: "listings".to_string(),
                field: name.to_string(),
            })
    };

    let category_col = column(&fields.category)?;
    let price_col = column(&fields.price)?;
    let lat_col = column(&fields.lat)?;
    let lon_col = column(&fields.lon)?;

    let mut listings = Vec::new();
    for result in reader.records() {
        let record = result?;
        listings.push(ListingRecord {
            category: record
                .get(category_col)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            price: parse_number(record.get(price_col)),
            lat: parse_number(record.get(lat_col)),
            lon: parse_number(record.get(lon_col)),
        });
    }

    Ok(listings)
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Tolerant numeric parse: trims whitespace and strips currency noise
/// (`$`, thousands commas) before parsing. Anything else becomes `None`.
fn parse_number(field: Option<&str>) -> Option<f64> {
    let cleaned: String = field?
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ListingFields {
        ListingFields::default()
    }

    #[test]
    fn test_parse_listings_basic() {
        let csv = b"tipo_vivi,precio,lat,lon\ncasa,12500.50,25.67,-100.31\ndepartamento,8000,25.68,-100.30\n";
        let listings = parse_listings(csv, &fields()).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].category.as_deref(), Some("casa"));
        assert_eq!(listings[0].price, Some(12500.50));
        assert_eq!(listings[0].lat, Some(25.67));
        assert_eq!(listings[1].lon, Some(-100.30));
    }

    #[test]
    fn test_latin1_bytes_decode() {
        // "Cañada" with a Latin-1 ñ (0xF1).
        let csv = b"tipo_vivi,precio,lat,lon\nCa\xf1ada,100,25.0,-100.0\n";
        let listings = parse_listings(csv, &fields()).unwrap();
        assert_eq!(listings[0].category.as_deref(), Some("Cañada"));
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let csv = b"tipo_vivi,lat,lon\ncasa,25.0,-100.0\n";
        let err = parse_listings(csv, &fields()).unwrap_err();
        match err {
            MapError::SchemaMismatch { dataset, field } => {
                assert_eq!(dataset, "listings");
                assert_eq!(field, "precio");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_cells_become_none() {
        let csv = b"tipo_vivi,precio,lat,lon\ncasa,n/a,25.0,\n,100,oops,-100.0\n";
        let listings = parse_listings(csv, &fields()).unwrap();

        assert_eq!(listings[0].price, None);
        assert_eq!(listings[0].lon, None);
        assert_eq!(listings[1].category, None);
        assert_eq!(listings[1].lat, None);
    }

    #[test]
    fn test_currency_noise_is_stripped() {
        let csv = b"tipo_vivi,precio,lat,lon\ncasa,\"$12,500.00\",25.0,-100.0\n";
        let listings = parse_listings(csv, &fields()).unwrap();
        assert_eq!(listings[0].price, Some(12500.0));
    }
}
