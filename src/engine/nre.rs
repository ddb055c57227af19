//! NRE apportionment
//!
//! Tooling and fixtures (stencils, test fixtures, pallets) have a life measured
//! in boards. Each selected item is bought as many times as the product volume
//! needs, and the total is spread over the product volume as a per-unit cost.
//!
//! A line whose life cycle is blank or zero has no defined quantity; that stays
//! `None` all the way to the report instead of becoming 0.

use serde::Serialize;
use thiserror::Error;

use crate::core::error::{CostError, Warning};
use crate::core::numeric::{Currency, Percent};
use crate::core::source::Sheet;
use crate::engine::volume::ProductVolumeParams;

/// Column names of the `NRE` sheet and of the export
pub mod columns {
    pub const ITEM: &str = "Item";
    pub const UNIT_PRICE: &str = "Unit Price (₹)";
    pub const LIFE_CYCLE_BOARDS: &str = "Life Cycle (Boards)";
    pub const QTY_FOR_LCV: &str = "Qty for LCV";
    pub const EXTENDED_PRICE: &str = "Extended Price (₹)";

    pub const LINE: &[&str] = &[
        ITEM,
        UNIT_PRICE,
        LIFE_CYCLE_BOARDS,
        QTY_FOR_LCV,
        EXTENDED_PRICE,
    ];

    pub const ANNUAL_VOLUME: &str = "Annual Volume";
    pub const PRODUCT_LIFE: &str = "Product Life";
    pub const PRODUCT_VOLUME: &str = "Product Volume";
    pub const TOTAL_COST: &str = "Total Cost (₹)";
    pub const TOOL_MAINTENANCE_RATE: &str = "Tool Maintenance Rate (%)";
    pub const TOTAL_EXTENDED_PRICE: &str = "Total Extended Price (₹)";
    // Labelled in dollars by the source workbook although the inputs are rupees
    pub const NRE_PER_UNIT: &str = "NRE Per Unit ($)";

    pub const SUMMARY: &[&str] = &[
        ANNUAL_VOLUME,
        PRODUCT_LIFE,
        PRODUCT_VOLUME,
        TOTAL_COST,
        TOOL_MAINTENANCE_RATE,
        TOTAL_EXTENDED_PRICE,
        NRE_PER_UNIT,
    ];
}

/// Currency the NRE catalog is priced in
pub const NRE_CURRENCY: Currency = Currency::Inr;

/// Quantity of an item needed over the product volume
///
/// `max(product_volume, life_cycle_boards) / life_cycle_boards`, so at least
/// one. Undefined when the life cycle is missing or not positive.
pub fn compute_lcv_quantity(product_volume: f64, life_cycle_boards: Option<f64>) -> Option<f64> {
    match life_cycle_boards {
        Some(boards) if boards > 0.0 => Some(product_volume.max(boards) / boards),
        _ => None,
    }
}

/// `unit_price * qty`, undefined unless both are defined
pub fn compute_extended_price(unit_price: Option<f64>, qty: Option<f64>) -> Option<f64> {
    Some(unit_price? * qty?)
}

/// One row of the NRE catalog, with the workbook's own defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NreLineItem {
    pub item: String,
    pub unit_price: Option<f64>,
    pub life_cycle_boards: Option<f64>,
    pub qty_for_lcv: Option<f64>,
    pub extended_price: Option<f64>,
}

/// The NRE catalog, keyed by item name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NreCatalog {
    items: Vec<NreLineItem>,
}

impl NreCatalog {
    /// Read the `NRE` sheet
    ///
    /// Rows without an item name are skipped; for repeated names the first
    /// row wins.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self, CostError> {
        sheet.require_columns(columns::LINE)?;
        let item_col = sheet.column(columns::ITEM)?;
        let price_col = sheet.column(columns::UNIT_PRICE)?;
        let life_col = sheet.column(columns::LIFE_CYCLE_BOARDS)?;
        let qty_col = sheet.column(columns::QTY_FOR_LCV)?;
        let ext_col = sheet.column(columns::EXTENDED_PRICE)?;

        let mut catalog = NreCatalog::default();
        for row in 0..sheet.row_count() {
            let item = sheet.text(row, item_col);
            if item.is_empty() || catalog.get(item).is_some() {
                continue;
            }
            catalog.items.push(NreLineItem {
                item: item.to_string(),
                unit_price: sheet.optional_number(row, price_col)?,
                life_cycle_boards: sheet.optional_number(row, life_col)?,
                qty_for_lcv: sheet.optional_number(row, qty_col)?,
                extended_price: sheet.optional_number(row, ext_col)?,
            });
        }

        tracing::debug!(items = catalog.items.len(), "NRE catalog loaded");
        Ok(catalog)
    }

    pub fn from_items(items: Vec<NreLineItem>) -> Self {
        let mut catalog = NreCatalog::default();
        for item in items {
            if catalog.get(&item.item).is_none() {
                catalog.items.push(item);
            }
        }
        catalog
    }

    pub fn get(&self, item: &str) -> Option<&NreLineItem> {
        self.items.iter().find(|i| i.item == item)
    }

    pub fn items(&self) -> &[NreLineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A chosen catalog item, re-apportioned against the session's product volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedNreLine {
    pub item: String,
    pub unit_price: Option<f64>,
    pub life_cycle_boards: Option<f64>,
    pub qty_for_lcv: Option<f64>,
    pub extended_price: Option<f64>,
}

impl SelectedNreLine {
    pub fn apportion(item: &NreLineItem, product_volume: f64) -> Self {
        let qty_for_lcv = compute_lcv_quantity(product_volume, item.life_cycle_boards);
        let extended_price = compute_extended_price(item.unit_price, qty_for_lcv);
        Self {
            item: item.item.clone(),
            unit_price: item.unit_price,
            life_cycle_boards: item.life_cycle_boards,
            qty_for_lcv,
            extended_price,
        }
    }
}

/// Adding an item that is already selected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record '{item}' already exists in the table")]
pub struct DuplicateSelection {
    pub item: String,
}

impl From<DuplicateSelection> for Warning {
    fn from(d: DuplicateSelection) -> Self {
        Warning::DuplicateSelection { item: d.item }
    }
}

/// The saved NRE lines, in insertion order, each item at most once
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NreSelection {
    lines: Vec<SelectedNreLine>,
}

impl NreSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a selection from saved item names
    ///
    /// Unknown and repeated names are reported as warnings and skipped.
    pub fn from_names<S: AsRef<str>>(
        catalog: &NreCatalog,
        names: &[S],
        product_volume: f64,
    ) -> (Self, Vec<Warning>) {
        let mut selection = NreSelection::new();
        let mut warnings = Vec::new();

        for name in names {
            let name = name.as_ref();
            let Some(item) = catalog.get(name) else {
                tracing::warn!(item = name, "NRE item not in catalog");
                warnings.push(Warning::UnknownNreItem {
                    item: name.to_string(),
                });
                continue;
            };
            if let Err(dup) = selection.add(SelectedNreLine::apportion(item, product_volume)) {
                warnings.push(dup.into());
            }
        }

        (selection, warnings)
    }

    /// Append a line; a line for an item already present is rejected
    pub fn add(&mut self, line: SelectedNreLine) -> Result<(), DuplicateSelection> {
        if self.contains(&line.item) {
            tracing::warn!(item = %line.item, "duplicate NRE selection rejected");
            return Err(DuplicateSelection { item: line.item });
        }
        self.lines.push(line);
        Ok(())
    }

    pub fn contains(&self, item: &str) -> bool {
        self.lines.iter().any(|l| l.item == item)
    }

    pub fn lines(&self) -> &[SelectedNreLine] {
        &self.lines
    }

    pub fn item_names(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.item.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The working row: an item picked from the catalog but not saved yet
#[derive(Debug, Clone, Default)]
pub struct NreSelector {
    draft: Option<SelectedNreLine>,
}

impl NreSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick an item and apportion it; an unknown name empties the working row
    pub fn select(
        &mut self,
        catalog: &NreCatalog,
        item: &str,
        product_volume: f64,
    ) -> Option<&SelectedNreLine> {
        self.draft = catalog
            .get(item)
            .map(|i| SelectedNreLine::apportion(i, product_volume));
        self.draft.as_ref()
    }

    pub fn draft(&self) -> Option<&SelectedNreLine> {
        self.draft.as_ref()
    }

    /// Save the working row; returns whether a line was appended
    pub fn save(&self, selection: &mut NreSelection) -> Result<bool, DuplicateSelection> {
        match &self.draft {
            Some(line) => selection.add(line.clone()).map(|_| true),
            None => Ok(false),
        }
    }

    /// Reset the working row; saved lines are untouched
    pub fn clear(&mut self) {
        self.draft = None;
    }
}

/// Totals over the selected lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NreSummary {
    pub lines: Vec<SelectedNreLine>,
    pub total_cost: f64,
    pub tool_maintenance_rate: Percent,
    pub tool_maintenance_cost: f64,
    pub total_extended_price: f64,
    /// Per-unit NRE; 0 when there is no product volume
    pub nre_per_unit: f64,
    pub currency: Currency,
}

impl NreSummary {
    pub fn compute(
        selection: &NreSelection,
        tool_maintenance_rate: Percent,
        product_volume: f64,
    ) -> Self {
        let total_cost: f64 = selection
            .lines()
            .iter()
            .map(|l| l.extended_price.unwrap_or(0.0))
            .sum();
        let tool_maintenance_cost = total_cost * tool_maintenance_rate.fraction();
        let total_extended_price = total_cost + tool_maintenance_cost;
        let nre_per_unit = if product_volume > 0.0 {
            total_extended_price / product_volume
        } else {
            0.0
        };

        tracing::debug!(
            lines = selection.len(),
            total_cost,
            total_extended_price,
            nre_per_unit,
            "NRE apportioned"
        );

        Self {
            lines: selection.lines().to_vec(),
            total_cost,
            tool_maintenance_rate,
            tool_maintenance_cost,
            total_extended_price,
            nre_per_unit,
            currency: NRE_CURRENCY,
        }
    }
}

/// The saved NRE table plus its summary scalars, as written to a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct NreExport {
    pub volume: ProductVolumeParams,
    pub summary: NreSummary,
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl NreExport {
    pub fn new(volume: ProductVolumeParams, summary: NreSummary) -> Self {
        Self { volume, summary }
    }

    /// One row per line; the summary scalars go on the first row only
    pub fn to_sheet(&self, sheet_name: &str) -> Sheet {
        let headers: Vec<String> = columns::LINE
            .iter()
            .chain(columns::SUMMARY.iter())
            .map(|h| h.to_string())
            .collect();

        let s = &self.summary;
        let scalars = [
            self.volume.annual_volume,
            self.volume.product_life,
            self.volume.product_volume(),
            s.total_cost,
            s.tool_maintenance_rate.whole(),
            s.total_extended_price,
            s.nre_per_unit,
        ];

        let mut rows: Vec<Vec<String>> = s
            .lines
            .iter()
            .map(|l| {
                vec![
                    l.item.clone(),
                    format_cell(l.unit_price),
                    format_cell(l.life_cycle_boards),
                    format_cell(l.qty_for_lcv),
                    format_cell(l.extended_price),
                ]
            })
            .collect();
        if rows.is_empty() {
            rows.push(vec![String::new(); columns::LINE.len()]);
        }
        for (i, row) in rows.iter_mut().enumerate() {
            if i == 0 {
                row.extend(scalars.iter().map(|v| v.to_string()));
            } else {
                row.extend(std::iter::repeat(String::new()).take(scalars.len()));
            }
        }

        Sheet::new(sheet_name, headers, rows)
    }

    /// Read an exported sheet back
    pub fn from_sheet(sheet: &Sheet) -> Result<Self, CostError> {
        sheet.require_columns(columns::LINE)?;
        sheet.require_columns(columns::SUMMARY)?;

        let item_col = sheet.column(columns::ITEM)?;
        let price_col = sheet.column(columns::UNIT_PRICE)?;
        let life_col = sheet.column(columns::LIFE_CYCLE_BOARDS)?;
        let qty_col = sheet.column(columns::QTY_FOR_LCV)?;
        let ext_col = sheet.column(columns::EXTENDED_PRICE)?;

        let mut lines = Vec::new();
        for row in 0..sheet.row_count() {
            let item = sheet.text(row, item_col);
            if item.is_empty() {
                continue;
            }
            lines.push(SelectedNreLine {
                item: item.to_string(),
                unit_price: sheet.optional_number(row, price_col)?,
                life_cycle_boards: sheet.optional_number(row, life_col)?,
                qty_for_lcv: sheet.optional_number(row, qty_col)?,
                extended_price: sheet.optional_number(row, ext_col)?,
            });
        }

        let scalar = |column: &str| -> Result<f64, CostError> {
            let col = sheet.column(column)?;
            Ok(sheet.optional_number(0, col)?.unwrap_or(0.0))
        };

        let volume = ProductVolumeParams::new(
            scalar(columns::ANNUAL_VOLUME)?,
            scalar(columns::PRODUCT_LIFE)?,
        );
        let summary = NreSummary {
            lines,
            total_cost: scalar(columns::TOTAL_COST)?,
            tool_maintenance_rate: Percent::new(scalar(columns::TOOL_MAINTENANCE_RATE)?),
            tool_maintenance_cost: 0.0,
            total_extended_price: scalar(columns::TOTAL_EXTENDED_PRICE)?,
            nre_per_unit: scalar(columns::NRE_PER_UNIT)?,
            currency: NRE_CURRENCY,
        };
        let tool_maintenance_cost = summary.total_extended_price - summary.total_cost;

        Ok(Self {
            volume,
            summary: NreSummary {
                tool_maintenance_cost,
                ..summary
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::sheets;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn catalog_sheet() -> Sheet {
        Sheet::from_rows(
            sheets::NRE,
            columns::LINE,
            &[
                &["Stencil", "1000", "500", "1", "1000"],
                &["ICT Fixture", "25000", "100000", "1", "25000"],
                &["Pallet", "800", "", "", ""],
                &["Stencil", "9999", "1", "1", "9999"],
                &["", "5", "5", "1", "5"],
            ],
        )
    }

    #[test]
    fn test_lcv_quantity_scenario() {
        // 1200 boards against a 500-board stencil life
        let qty = compute_lcv_quantity(1200.0, Some(500.0)).unwrap();
        assert!(close(qty, 2.4));
        assert!(close(compute_extended_price(Some(1000.0), Some(qty)).unwrap(), 2400.0));
    }

    #[test]
    fn test_lcv_quantity_at_least_one() {
        for volume in [0.0, 1.0, 499.0, 500.0, 501.0, 1e6] {
            for boards in [1.0, 10.0, 500.0, 1e5] {
                assert!(compute_lcv_quantity(volume, Some(boards)).unwrap() >= 1.0);
            }
        }
    }

    #[test]
    fn test_lcv_quantity_undefined_without_life_cycle() {
        assert_eq!(compute_lcv_quantity(1200.0, Some(0.0)), None);
        assert_eq!(compute_lcv_quantity(1200.0, None), None);
        assert_eq!(compute_extended_price(Some(1000.0), None), None);
        assert_eq!(compute_extended_price(None, Some(2.0)), None);
    }

    #[test]
    fn test_catalog_from_sheet() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        assert_eq!(catalog.len(), 3);
        // First occurrence wins
        assert_eq!(catalog.get("Stencil").unwrap().unit_price, Some(1000.0));
        assert_eq!(catalog.get("Pallet").unwrap().life_cycle_boards, None);
    }

    #[test]
    fn test_catalog_requires_columns() {
        let sheet = Sheet::from_rows(sheets::NRE, &["Item", "Unit Price (₹)"], &[]);
        assert!(NreCatalog::from_sheet(&sheet).unwrap_err().is_schema_error());
    }

    #[test]
    fn test_duplicate_selection_leaves_selection_unchanged() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let mut selection = NreSelection::new();
        let stencil = SelectedNreLine::apportion(catalog.get("Stencil").unwrap(), 1200.0);
        selection.add(stencil.clone()).unwrap();

        let before = selection.clone();
        let err = selection.add(stencil).unwrap_err();
        assert_eq!(err.item, "Stencil");
        assert_eq!(selection, before);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_selection_from_names() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let (selection, warnings) =
            NreSelection::from_names(&catalog, &["Pallet", "Stencil", "Ghost", "Pallet"], 1200.0);

        assert_eq!(selection.item_names(), vec!["Pallet", "Stencil"]);
        assert_eq!(
            warnings,
            vec![
                Warning::UnknownNreItem {
                    item: "Ghost".to_string()
                },
                Warning::DuplicateSelection {
                    item: "Pallet".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_selector_clear_is_idempotent_and_keeps_saved_lines() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let mut selection = NreSelection::new();
        let mut selector = NreSelector::new();

        assert!(selector.select(&catalog, "Stencil", 1200.0).is_some());
        assert!(selector.save(&mut selection).unwrap());

        selector.clear();
        selector.clear();
        assert!(selector.draft().is_none());
        assert_eq!(selection.len(), 1);

        // Saving an empty working row is a no-op
        assert!(!selector.save(&mut selection).unwrap());

        selector.select(&catalog, "Stencil", 1200.0);
        assert!(selector.save(&mut selection).is_err());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_selector_unknown_item() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let mut selector = NreSelector::new();
        assert!(selector.select(&catalog, "Nope", 1200.0).is_none());
    }

    #[test]
    fn test_summary_totals() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let (selection, _) =
            NreSelection::from_names(&catalog, &["Stencil", "ICT Fixture", "Pallet"], 1200.0);
        let summary = NreSummary::compute(&selection, Percent::new(10.0), 1200.0);

        // Stencil 2400, fixture 25000 (life exceeds volume), pallet undefined -> 0
        assert!(close(summary.total_cost, 27400.0));
        assert!(close(summary.tool_maintenance_cost, 2740.0));
        assert!(close(summary.total_extended_price, 30140.0));
        assert!(close(summary.nre_per_unit, 30140.0 / 1200.0));
        assert_eq!(summary.lines[2].qty_for_lcv, None);
        assert_eq!(summary.currency, Currency::Inr);
    }

    #[test]
    fn test_nre_per_unit_zero_without_volume() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let (selection, _) = NreSelection::from_names(&catalog, &["Stencil"], 0.0);
        let summary = NreSummary::compute(&selection, Percent::ZERO, 0.0);
        assert!(close(summary.total_cost, 1000.0));
        assert_eq!(summary.nre_per_unit, 0.0);
    }

    #[test]
    fn test_export_round_trip() {
        let catalog = NreCatalog::from_sheet(&catalog_sheet()).unwrap();
        let volume = ProductVolumeParams::new(333.0, 3.7);
        let pv = volume.product_volume();
        let (selection, _) =
            NreSelection::from_names(&catalog, &["Stencil", "Pallet", "ICT Fixture"], pv);
        let summary = NreSummary::compute(&selection, Percent::new(7.5), pv);
        let export = NreExport::new(volume, summary);

        let sheet = export.to_sheet("NRE Lines");
        assert_eq!(sheet.row_count(), 3);
        // Scalars only on the first row
        let col = sheet.column(columns::NRE_PER_UNIT).unwrap();
        assert!(!sheet.text(0, col).is_empty());
        assert!(sheet.text(1, col).is_empty());

        let back = NreExport::from_sheet(&sheet).unwrap();
        assert_eq!(back.summary.lines.len(), 3);
        for (a, b) in export.summary.lines.iter().zip(&back.summary.lines) {
            assert_eq!(a.item, b.item);
            assert_eq!(a.qty_for_lcv.is_some(), b.qty_for_lcv.is_some());
            if let (Some(x), Some(y)) = (a.extended_price, b.extended_price) {
                assert!(close(x, y));
            }
        }
        assert!(close(back.summary.total_cost, export.summary.total_cost));
        assert!(close(back.summary.nre_per_unit, export.summary.nre_per_unit));
        assert!(close(
            back.summary.tool_maintenance_rate.whole(),
            export.summary.tool_maintenance_rate.whole()
        ));
        assert!(close(back.volume.product_volume(), pv));
    }

    #[test]
    fn test_export_without_lines_still_writes_summary() {
        let summary = NreSummary::compute(&NreSelection::new(), Percent::ZERO, 100.0);
        let sheet =
            NreExport::new(ProductVolumeParams::new(50.0, 2.0), summary).to_sheet("S");
        assert_eq!(sheet.row_count(), 1);
        let back = NreExport::from_sheet(&sheet).unwrap();
        assert!(back.summary.lines.is_empty());
        assert_eq!(back.volume.annual_volume, 50.0);
    }

    fn rel_close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
    }

    fn assert_opt_close(a: Option<f64>, b: Option<f64>) {
        match (a, b) {
            (Some(x), Some(y)) => assert!(rel_close(x, y), "{} != {}", x, y),
            (None, None) => {}
            _ => panic!("{:?} != {:?}", a, b),
        }
    }

    #[test]
    fn test_export_round_trip_through_csv_workbook() {
        use crate::core::source::{CsvWorkbook, TabularSink, TabularSource};

        let item = |name: &str, price: Option<f64>, life: Option<f64>| NreLineItem {
            item: name.to_string(),
            unit_price: price,
            life_cycle_boards: life,
            qty_for_lcv: None,
            extended_price: None,
        };
        let catalog = NreCatalog::from_items(vec![
            item("Stencil, top", Some(0.1 + 0.2), Some(7.0)),
            item("ICT Fixture", Some(1000.0 / 3.0), Some(3.0)),
            item("Pallet", Some(800.0), None),
        ]);
        let volume = ProductVolumeParams::new(1000.0 / 3.0, 0.1 + 0.2);
        let pv = volume.product_volume();
        let (selection, _) =
            NreSelection::from_names(&catalog, &["Stencil, top", "ICT Fixture", "Pallet"], pv);
        let summary = NreSummary::compute(&selection, Percent::new(7.5), pv);
        let export = NreExport::new(volume, summary);

        let dir = tempfile::tempdir().unwrap();
        let mut workbook = CsvWorkbook::open(dir.path().join("export"));
        workbook.write_sheet(&export.to_sheet("NRE Export")).unwrap();
        let sheet = workbook.load_sheet("NRE Export").unwrap();
        let back = NreExport::from_sheet(&sheet).unwrap();

        assert_eq!(back.summary.lines.len(), export.summary.lines.len());
        for (a, b) in export.summary.lines.iter().zip(&back.summary.lines) {
            assert_eq!(a.item, b.item);
            assert_opt_close(a.unit_price, b.unit_price);
            assert_opt_close(a.life_cycle_boards, b.life_cycle_boards);
            assert_opt_close(a.qty_for_lcv, b.qty_for_lcv);
            assert_opt_close(a.extended_price, b.extended_price);
        }
        assert_eq!(back.summary.lines[2].qty_for_lcv, None);
        assert_eq!(back.summary.lines[2].extended_price, None);

        let (a, b) = (&export, &back);
        assert!(rel_close(a.volume.annual_volume, b.volume.annual_volume));
        assert!(rel_close(a.volume.product_life, b.volume.product_life));
        assert!(rel_close(a.summary.total_cost, b.summary.total_cost));
        assert!(rel_close(
            a.summary.tool_maintenance_rate.whole(),
            b.summary.tool_maintenance_rate.whole()
        ));
        assert!(rel_close(
            a.summary.tool_maintenance_cost,
            b.summary.tool_maintenance_cost
        ));
        assert!(rel_close(
            a.summary.total_extended_price,
            b.summary.total_extended_price
        ));
        assert!(rel_close(a.summary.nre_per_unit, b.summary.nre_per_unit));
    }
}
