use chrono::{Datelike, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tarragona_domain::{FactoryOrderLine, FactoryOrderSheet, Sku, PALLETS_PER_CONTAINER};

const SPANISH_MONTHS: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// §6.2 SKU normalization for the factory-order sheet, applied in the
/// fixed order the spec gives: strip `(T)`, strip a trailing ` BTE`
/// (case-insensitive), strip format suffixes like ` 51X51`/` 51X51-1`,
/// strip a trailing `-<digit>`, trim.
pub fn normalize_sku(raw: &str) -> String {
    let mut s = raw.replace("(T)", "");

    if s.to_uppercase().trim_end().ends_with("BTE") {
        let trimmed_len = s.trim_end().len();
        s.truncate(trimmed_len - 3);
        s = s.trim_end().to_string();
    }

    // format suffix: a trailing space-separated token carrying a digit, e.g. "51X51" / "51X51-1".
    if let Some(pos) = s.rfind(' ') {
        if s[pos + 1..].chars().any(|c| c.is_ascii_digit()) {
            s.truncate(pos);
        }
    }
    s = s.trim_end().to_string();

    // trailing "-<digit>" variant suffix.
    if let Some(pos) = s.rfind('-') {
        let tail = &s[pos + 1..];
        if tail.len() == 1 && tail.chars().all(|c| c.is_ascii_digit()) {
            s.truncate(pos);
        }
    }

    s.trim().to_string()
}

/// §6.2 "Spanish month" field: `month(departure) + 1`, wrapping
/// December → January with a year increment.
pub fn production_month_spanish(departure: NaiveDate) -> String {
    let next_month = departure.month0() + 1;
    let index = (next_month % 12) as usize;
    SPANISH_MONTHS[index].to_string()
}

/// Builds the fully-specified, pure sheet model (§6.2, §D). Rendering to
/// bytes is a separate, branch-free step (`render_xlsx`).
pub fn build_sheet(order_date: NaiveDate, boat_departure: NaiveDate, products: &[(Sku, String, Decimal)]) -> FactoryOrderSheet {
    let lines: Vec<FactoryOrderLine> = products
        .iter()
        .filter(|(_, _, m2)| *m2 > Decimal::ZERO)
        .map(|(sku, format, m2)| FactoryOrderLine {
            normalized_sku: Sku(normalize_sku(&sku.0)),
            format: format.clone(),
            requested_m2: m2.round(),
        })
        .collect();

    let total_m2: Decimal = lines.iter().map(|l| l.requested_m2).sum();
    let total_pallets = (total_m2 / tarragona_domain::M2_PER_PALLET).ceil();
    let total_containers = (total_pallets / Decimal::from(PALLETS_PER_CONTAINER)).ceil();

    FactoryOrderSheet {
        order_date,
        production_month_spanish: production_month_spanish(boat_departure),
        lines,
        total_m2,
        total_containers: total_containers.to_u32().unwrap_or(0),
    }
}

/// Thin, branch-free XLSX renderer consuming an already-correct
/// `FactoryOrderSheet` (§D) — mirrors the teacher's one-shot file-writer
/// adapters rather than re-deriving any of the sheet's business logic.
pub fn render_xlsx(sheet: &FactoryOrderSheet) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name("PEDIDO TARRAGONA")?;

    let title_format = Format::new().set_bold().set_font_size(14.0);
    let bold = Format::new().set_bold();
    let header_format = Format::new().set_bold().set_border_bottom(rust_xlsxwriter::FormatBorder::Thin);
    let number_format = Format::new().set_num_format("#,##0");

    worksheet.write_string_with_format(0, 0, "Pedido Tarragona Guatemala", &title_format)?;
    worksheet.write_string(2, 0, "Fecha de pedido:")?;
    worksheet.write_string(2, 1, &sheet.order_date.format("%d/%m/%Y").to_string())?;
    worksheet.write_string(4, 0, "Fabricacion para:")?;
    worksheet.write_string_with_format(4, 1, &sheet.production_month_spanish, &bold)?;

    worksheet.write_string_with_format(6, 0, "Referencia", &header_format)?;
    worksheet.write_string_with_format(6, 1, "Formato", &header_format)?;
    worksheet.write_string_with_format(6, 2, "M2 solicitados", &header_format)?;

    let mut row = 7u32;
    for line in &sheet.lines {
        worksheet.write_string(row, 0, &line.normalized_sku.0)?;
        worksheet.write_string(row, 1, &line.format)?;
        worksheet.write_number_with_format(row, 2, line.requested_m2.to_f64().unwrap_or(0.0), &number_format)?;
        row += 1;
    }

    row += 1;
    worksheet.write_string_with_format(row, 0, "TOTAL", &bold)?;
    worksheet.write_number_with_format(row, 2, sheet.total_m2.to_f64().unwrap_or(0.0), &number_format)?;

    row += 2;
    worksheet.write_string(row, 0, &format!("{} CONTENEDORES", sheet.total_containers))?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalizes_format_suffix_and_dash_variant() {
        assert_eq!(normalize_sku("PORCELANATO 51X51"), "PORCELANATO");
        assert_eq!(normalize_sku("PORCELANATO 51X51-1"), "PORCELANATO");
    }

    #[test]
    fn strips_t_marker_bte_suffix_and_trailing_variant_digit() {
        assert_eq!(normalize_sku("TILE-9 (T) BTE"), "TILE");
    }

    #[test]
    fn dash_followed_by_multiple_digits_is_kept() {
        assert_eq!(normalize_sku("CERAMIC-90"), "CERAMIC-90");
    }

    #[test]
    fn production_month_wraps_december_to_january() {
        let departure = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        assert_eq!(production_month_spanish(departure), "ENERO");
    }

    #[test]
    fn zero_m2_lines_are_dropped() {
        let sheet = build_sheet(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            &[
                (Sku("A 51X51".to_string()), "51X51".to_string(), dec!(500)),
                (Sku("B 51X51".to_string()), "51X51".to_string(), Decimal::ZERO),
            ],
        );
        assert_eq!(sheet.lines.len(), 1);
        assert_eq!(sheet.lines[0].normalized_sku.0, "A");
    }
}
