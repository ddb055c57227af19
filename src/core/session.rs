//! Calculation session: persisted inputs, the loaded tables, and the full
//! recomputation pass that turns them into a [`CostReport`]

use miette::Diagnostic;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::CostConstants;
use crate::core::error::{CostError, Warning};
use crate::core::numeric::Amount;
use crate::core::params::{fields, ParameterInput, ParameterReader};
use crate::core::source::{sheets, CsvWorkbook, Sheet, TabularSource};
use crate::engine::consumables::{
    BoardGeometry, ConsumableCosts, ConsumableInputs, ConsumableParams, GlueParams, PasteSide,
    CONSUMABLES_CURRENCY,
};
use crate::engine::nre::{NreCatalog, NreSelection, NreSummary};
use crate::engine::ohp::{CostSummary, MaterialCosts, OverheadRates, RollupInputs};
use crate::engine::process::{
    compute_process_costs, load_process_stages, DevelopmentStage, ManufacturingTotals,
    ProcessCostFactors, ProcessCosting,
};
use crate::engine::rates::{load_machine_rates, RateContext};
use crate::engine::volume::ProductVolumeParams;

/// Default session file name
pub const SESSION_FILE: &str = "session.yaml";

/// The persisted part of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFile {
    /// Rate workbook holding `Process_CT`, `NRE`, `MMR-EMS` and `Assumptions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook: Option<PathBuf>,

    /// Process-mapping workbook or CSV file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_mapping: Option<PathBuf>,

    /// Sheet of the process-mapping workbook to cost; the first sheet when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_sheet: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DevelopmentStage>,

    /// Saved NRE line items, in insertion order
    pub nre_items: Vec<String>,

    /// User-entered fields; numbers, text and blanks are all accepted
    pub parameters: BTreeMap<String, serde_yml::Value>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self, CostError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CostError::Session(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut session: SessionFile = serde_yml::from_str(&content)
            .map_err(|e| CostError::Session(format!("{}: {}", path.display(), e)))?;
        session.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(path = %path.display(), items = session.nre_items.len(), "session loaded");
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<(), CostError> {
        let yaml = serde_yml::to_string(self)
            .map_err(|e| CostError::Session(format!("cannot serialize session: {}", e)))?;
        fs::write(path, yaml).map_err(|e| {
            CostError::Session(format!("cannot write {}: {}", path.display(), e))
        })
    }

    /// Resolve a path from the session file against the file's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn workbook_path(&self) -> Option<PathBuf> {
        self.workbook.as_deref().map(|p| self.resolve(p))
    }

    pub fn process_mapping_path(&self) -> Option<PathBuf> {
        self.process_mapping.as_deref().map(|p| self.resolve(p))
    }

    /// A starter session listing every parameter
    pub fn template() -> String {
        let mut out = String::from(
            "# pcbcost session\n\
             # Paths are relative to this file.\n\
             workbook: rates\n\
             process_mapping: process_mapping.csv\n\
             # process_sheet: Line A\n\
             stage: MK0\n\
             nre_items: []\n\
             # Percentages are whole numbers (10 means 10%). Blank fields count as 0.\n\
             parameters:\n",
        );
        for field in fields::ALL {
            out.push_str(&format!("  {}: \n", field));
        }
        out
    }
}

fn yaml_scalar_text(value: &serde_yml::Value) -> String {
    match value {
        serde_yml::Value::Null => String::new(),
        serde_yml::Value::Bool(b) => b.to_string(),
        serde_yml::Value::Number(n) => n.to_string(),
        serde_yml::Value::String(s) => s.clone(),
        other => serde_yml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl ParameterInput for SessionFile {
    fn raw(&self, name: &str) -> Option<String> {
        self.parameters.get(name).map(yaml_scalar_text)
    }
}

/// Everything one recomputation pass reads, loaded up front
///
/// Each table is held as its own `Result` so a failed read only disables the
/// formula blocks that depend on it.
#[derive(Debug, Clone)]
pub struct SessionInputs {
    pub process_ct: Result<Sheet, CostError>,
    pub assumptions: Result<Sheet, CostError>,
    pub nre: Result<Sheet, CostError>,
    pub mmr: Result<Sheet, CostError>,
    pub process_mapping: Result<Sheet, CostError>,
    pub stage: Option<DevelopmentStage>,
    pub nre_items: Vec<String>,
    /// Raw parameter text with overrides applied
    pub parameters: BTreeMap<String, String>,
    pub constants: CostConstants,
}

fn load_from(
    source: Option<&dyn TabularSource>,
    what: &str,
    sheet: &str,
) -> Result<Sheet, CostError> {
    match source {
        Some(source) => source.load_sheet(sheet),
        None => Err(CostError::Session(format!("no {} set in the session", what))),
    }
}

/// Load the named process sheet, or the first one in the workbook
fn load_mapping_sheet(
    source: Option<&dyn TabularSource>,
    process_sheet: Option<&str>,
) -> Result<Sheet, CostError> {
    let Some(source) = source else {
        return load_from(None, "process_mapping", "");
    };
    match process_sheet {
        Some(name) => source.load_sheet(name),
        None => {
            let names = source.sheet_names()?;
            let first = names.first().ok_or_else(|| CostError::SourceRead {
                source_name: source.source_name(),
                message: "workbook has no sheets".to_string(),
            })?;
            source.load_sheet(first)
        }
    }
}

impl SessionInputs {
    /// Read all tables from already-opened sources
    pub fn from_sources(
        session: &SessionFile,
        workbook: Option<&dyn TabularSource>,
        mapping: Option<&dyn TabularSource>,
        overrides: &BTreeMap<String, String>,
        constants: CostConstants,
    ) -> Self {
        let mut parameters: BTreeMap<String, String> = session
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), yaml_scalar_text(v)))
            .collect();
        parameters.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            process_ct: load_from(workbook, "workbook", sheets::PROCESS_CT),
            assumptions: load_from(workbook, "workbook", sheets::ASSUMPTIONS),
            nre: load_from(workbook, "workbook", sheets::NRE),
            mmr: load_from(workbook, "workbook", sheets::MMR_EMS),
            process_mapping: load_mapping_sheet(mapping, session.process_sheet.as_deref()),
            stage: session.stage,
            nre_items: session.nre_items.clone(),
            parameters,
            constants,
        }
    }

    /// Open the session's CSV workbooks and read all tables
    pub fn load(
        session: &SessionFile,
        overrides: &BTreeMap<String, String>,
        constants: CostConstants,
    ) -> Self {
        let workbook = session.workbook_path().map(CsvWorkbook::open);
        let mapping = session.process_mapping_path().map(CsvWorkbook::open);
        Self::from_sources(
            session,
            workbook.as_ref().map(|w| w as &dyn TabularSource),
            mapping.as_ref().map(|w| w as &dyn TabularSource),
            overrides,
            constants,
        )
    }

    pub fn catalog(&self) -> Result<NreCatalog, CostError> {
        NreCatalog::from_sheet(self.nre.as_ref().map_err(Clone::clone)?)
    }

    pub fn rate_context(&self) -> Result<RateContext, CostError> {
        let process_ct = self.process_ct.as_ref().map_err(Clone::clone)?;
        let assumptions = self.assumptions.as_ref().map_err(Clone::clone)?;
        RateContext::from_sheets(process_ct, assumptions)
    }
}

/// The result of one recomputation pass
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub stage: Option<DevelopmentStage>,
    pub volume: ProductVolumeParams,
    pub product_volume: f64,
    #[serde(serialize_with = "serialize_block")]
    pub rates: Result<RateContext, CostError>,
    #[serde(serialize_with = "serialize_block")]
    pub nre: Result<NreSummary, CostError>,
    #[serde(serialize_with = "serialize_block")]
    pub process: Result<ProcessCosting, CostError>,
    pub consumables: ConsumableCosts,
    pub materials: MaterialCosts,
    pub overhead_rates: OverheadRates,
    pub summary: CostSummary,
    pub warnings: Vec<Warning>,
}

impl CostReport {
    /// Errors of the blocks that could not be computed
    pub fn block_errors(&self) -> Vec<(&'static str, &CostError)> {
        let mut errors = Vec::new();
        if let Err(e) = &self.rates {
            errors.push(("rates", e));
        }
        if let Err(e) = &self.nre {
            errors.push(("nre", e));
        }
        if let Err(e) = &self.process {
            errors.push(("process", e));
        }
        errors
    }
}

/// Write a block as its value, or as `{error, code}` when it failed
fn serialize_block<T: Serialize, S: Serializer>(
    block: &Result<T, CostError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match block {
        Ok(value) => value.serialize(serializer),
        Err(e) => {
            let mut map = serializer.serialize_map(Some(2))?;
            map.serialize_entry("error", &e.to_string())?;
            map.serialize_entry("code", &e.code().map(|c| c.to_string()))?;
            map.end()
        }
    }
}

fn volume_params(reader: &mut ParameterReader) -> ProductVolumeParams {
    ProductVolumeParams::new(
        reader.number(fields::ANNUAL_VOLUME),
        reader.number(fields::PRODUCT_LIFE),
    )
}

fn consumable_inputs(reader: &mut ParameterReader) -> ConsumableInputs {
    ConsumableInputs {
        glue: GlueParams {
            glue_weight: reader.number(fields::GLUE_WEIGHT),
            specific_gravity: reader.number(fields::GLUE_SPECIFIC_GRAVITY),
            wastage: reader.percent(fields::GLUE_WASTAGE),
            unit_cost: reader.number(fields::GLUE_UNIT_COST),
        },
        board: BoardGeometry {
            length: reader.number(fields::BOARD_LENGTH),
            width: reader.number(fields::BOARD_WIDTH),
        },
        paste_thickness: reader.number(fields::PASTE_THICKNESS),
        top: PasteSide {
            weight_estimate: reader.percent(fields::TOP_WEIGHT_ESTIMATE),
            wastage: reader.percent(fields::TOP_PASTE_WASTAGE),
        },
        bottom: PasteSide {
            weight_estimate: reader.percent(fields::BOTTOM_WEIGHT_ESTIMATE),
            wastage: reader.percent(fields::BOTTOM_PASTE_WASTAGE),
        },
        flux_wastage: reader.percent(fields::FLUX_WASTAGE),
    }
}

fn material_costs(reader: &mut ParameterReader) -> MaterialCosts {
    MaterialCosts {
        pcb: reader.number(fields::PCB_COST),
        electronics: reader.number(fields::ELECTRONICS_COST),
        mechanical: reader.number(fields::MECHANICAL_COST),
        direct_consumables: reader.number(fields::DIRECT_CONSUMABLES),
    }
}

fn overhead_rates(reader: &mut ParameterReader) -> OverheadRates {
    OverheadRates {
        moh: reader.percent(fields::MOH),
        foh: reader.percent(fields::FOH),
        profit_on_rm: reader.percent(fields::PROFIT_ON_RM),
        profit_on_va: reader.percent(fields::PROFIT_ON_VA),
        rnd: reader.percent(fields::RND),
        warranty: reader.percent(fields::WARRANTY),
        sga: reader.percent(fields::SGA),
    }
}

/// Compute every block and roll them up
///
/// Deterministic and free of side effects other than log events: the same
/// inputs always give the same report. A failed block contributes 0 to the
/// summary and keeps its error in the report.
pub fn compute_cost_summary(inputs: &SessionInputs) -> CostReport {
    let mut reader = ParameterReader::new(&inputs.parameters);
    let constants = &inputs.constants;

    let volume = volume_params(&mut reader);
    let product_volume = volume.product_volume();
    let tool_maintenance_rate = reader.percent(fields::TOOL_MAINTENANCE_RATE);
    let consumable_inputs = consumable_inputs(&mut reader);
    let materials = material_costs(&mut reader);
    let overhead_rates = overhead_rates(&mut reader);
    let mut warnings = reader.into_warnings();

    let rates = inputs.rate_context();

    let nre = inputs.catalog().map(|catalog| {
        let (selection, nre_warnings) =
            NreSelection::from_names(&catalog, inputs.nre_items.as_slice(), product_volume);
        warnings.extend(nre_warnings);
        NreSummary::compute(&selection, tool_maintenance_rate, product_volume)
    });

    let process = compute_process_block(inputs, rates.as_ref(), &volume);

    let consumables = ConsumableParams::new(&consumable_inputs, constants).compute();

    let summary = CostSummary::compute(&RollupInputs {
        materials,
        nre_per_unit: nre
            .as_ref()
            .map(|n| Amount::new(n.nre_per_unit, n.currency))
            .unwrap_or_else(|_| Amount::inr(0.0)),
        consumables_per_board: Amount::new(consumables.total_per_board(), CONSUMABLES_CURRENCY),
        manufacturing: process
            .as_ref()
            .map(|p| p.totals)
            .unwrap_or_else(|_| ManufacturingTotals::default()),
        rates: overhead_rates,
    });
    warnings.extend(summary.warnings.iter().cloned());

    let report = CostReport {
        stage: inputs.stage,
        volume,
        product_volume,
        rates,
        nre,
        process,
        consumables,
        materials,
        overhead_rates,
        summary,
        warnings,
    };
    for (block, e) in report.block_errors() {
        tracing::warn!(block, error = %e, "block not computed; contributes 0");
    }
    report
}

fn compute_process_block(
    inputs: &SessionInputs,
    rates: Result<&RateContext, &CostError>,
    volume: &ProductVolumeParams,
) -> Result<ProcessCosting, CostError> {
    let rates = rates.map_err(Clone::clone)?;
    let machine_rates = load_machine_rates(inputs.mmr.as_ref().map_err(Clone::clone)?)?;
    let mapping = inputs.process_mapping.as_ref().map_err(Clone::clone)?;
    let stages = load_process_stages(mapping)?;

    let factors = ProcessCostFactors::new(
        rates,
        inputs.constants.labor_burden,
        volume.batch_qty(inputs.constants.months_per_year),
    );
    Ok(compute_process_costs(
        &mapping.name,
        &stages,
        &machine_rates,
        &factors,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::MemoryWorkbook;
    use tempfile::tempdir;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn workbook(mmr_headers: &[&str]) -> MemoryWorkbook {
        MemoryWorkbook::new("rates")
            .with_sheet(Sheet::from_rows(
                sheets::PROCESS_CT,
                &["Shift Hr/day", "Days/Week", "Weeks/Year", "Overall Labor Efficiency"],
                &[&["8", "5", "50", "0.85"]],
            ))
            .with_sheet(Sheet::from_rows(
                sheets::ASSUMPTIONS,
                &["Labour cost/Hr", "Idl Cost/Hr"],
                &[&["360", "180"]],
            ))
            .with_sheet(Sheet::from_rows(
                sheets::NRE,
                &[
                    "Item",
                    "Unit Price (₹)",
                    "Life Cycle (Boards)",
                    "Qty for LCV",
                    "Extended Price (₹)",
                ],
                &[&["Stencil", "1000", "500", "", ""], &["Fixture", "5000", "", "", ""]],
            ))
            .with_sheet(Sheet::from_rows(
                sheets::MMR_EMS,
                mmr_headers,
                &[&["SMT", "0.25"]],
            ))
    }

    fn mapping() -> MemoryWorkbook {
        MemoryWorkbook::new("mapping").with_sheet(Sheet::from_rows(
            "Line A",
            &[
                "Stage",
                "Process Cycle Time",
                "Batch Set up Time",
                "DL FTE",
                "IDL FTE",
                "FTE for Batch Set up",
            ],
            &[&["SMT", "60", "1800", "1", "0.5", "2"]],
        ))
    }

    fn session() -> SessionFile {
        let yaml = "nre_items: [Stencil, Fixture, Stencil]\n\
                    stage: MK1\n\
                    parameters:\n  \
                      annual_volume: 1200\n  \
                      product_life: 1\n  \
                      tool_maintenance_rate: 10\n  \
                      glue_weight: 0.5\n  \
                      glue_specific_gravity: 8.9\n  \
                      glue_wastage: 10\n  \
                      glue_unit_cost: 1\n  \
                      pcb_cost: 3\n  \
                      electronics_cost: lots\n  \
                      mechanical_cost: ~\n";
        serde_yml::from_str(yaml).unwrap()
    }

    fn inputs(mmr_headers: &[&str]) -> SessionInputs {
        let wb = workbook(mmr_headers);
        let map = mapping();
        SessionInputs::from_sources(
            &session(),
            Some(&wb),
            Some(&map),
            &BTreeMap::new(),
            CostConstants::default(),
        )
    }

    #[test]
    fn test_full_pass() {
        let report = compute_cost_summary(&inputs(&["Process Name", "MMR"]));

        assert_eq!(report.stage, Some(DevelopmentStage::Mk1));
        assert_eq!(report.rates.as_ref().unwrap().hours_per_year_per_shift(), 2000.0);

        let nre = report.nre.as_ref().unwrap();
        assert_eq!(nre.lines.len(), 2);
        assert!(close(nre.total_cost, 2400.0));
        assert!(close(nre.total_extended_price, 2640.0));
        assert!(close(nre.nre_per_unit, 2.2));

        let process = report.process.as_ref().unwrap();
        assert_eq!(process.batch_qty, 100.0);
        assert!(close(process.totals.va_machine, 15.0));

        assert!(close(report.consumables.glue.weight_per_board, 4.895));
        assert!(close(report.summary.material_cost, 3.0 + 2.2 + 4.895));

        assert!(report.warnings.contains(&Warning::DuplicateSelection {
            item: "Stencil".to_string()
        }));
        assert!(report.warnings.contains(&Warning::InvalidNumber {
            field: "electronics_cost".to_string(),
            raw: "lots".to_string()
        }));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::CurrencyMix { .. })));
    }

    #[test]
    fn test_missing_mmr_column_only_disables_process() {
        let report = compute_cost_summary(&inputs(&["Process Name", "Rate"]));

        assert!(report.process.as_ref().unwrap_err().is_schema_error());
        assert!(report.nre.is_ok());
        assert!(close(report.consumables.total_per_board(), 4.895));
        assert_eq!(report.summary.manufacturing_cost, 0.0);
        assert_eq!(report.block_errors().len(), 1);
    }

    #[test]
    fn test_missing_workbook_fails_table_blocks() {
        let map = mapping();
        let inputs = SessionInputs::from_sources(
            &session(),
            None,
            Some(&map),
            &BTreeMap::new(),
            CostConstants::default(),
        );
        let report = compute_cost_summary(&inputs);
        assert_eq!(report.block_errors().len(), 3);
        assert!(close(report.summary.grand_total, 3.0 + 4.895));
    }

    #[test]
    fn test_overrides_apply() {
        let wb = workbook(&["Process Name", "MMR"]);
        let overrides = BTreeMap::from([("annual_volume".to_string(), "0".to_string())]);
        let inputs = SessionInputs::from_sources(
            &session(),
            Some(&wb),
            None,
            &overrides,
            CostConstants::default(),
        );
        let report = compute_cost_summary(&inputs);
        assert_eq!(report.product_volume, 0.0);
        assert_eq!(report.nre.as_ref().unwrap().nre_per_unit, 0.0);
        assert!(report.process.is_err());
    }

    #[test]
    fn test_first_mapping_sheet_is_default() {
        let map = mapping().with_sheet(Sheet::from_rows("Line B", &["Stage"], &[]));
        let sheet = load_mapping_sheet(Some(&map), None).unwrap();
        assert_eq!(sheet.name, "Line A");
        let sheet = load_mapping_sheet(Some(&map), Some("Line B")).unwrap();
        assert_eq!(sheet.name, "Line B");
    }

    #[test]
    fn test_session_round_trip_and_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);
        let mut session = session();
        session.workbook = Some(PathBuf::from("rates"));
        session.save(&path).unwrap();

        let loaded = SessionFile::load(&path).unwrap();
        assert_eq!(loaded.nre_items, session.nre_items);
        assert_eq!(loaded.workbook_path(), Some(dir.path().join("rates")));
        assert_eq!(loaded.raw("annual_volume").as_deref(), Some("1200"));
        assert_eq!(loaded.raw("mechanical_cost").as_deref(), Some(""));
    }

    #[test]
    fn test_template_parses() {
        let session: SessionFile = serde_yml::from_str(&SessionFile::template()).unwrap();
        assert_eq!(session.stage, Some(DevelopmentStage::Mk0));
        assert_eq!(session.parameters.len(), fields::ALL.len());
        assert_eq!(session.raw(fields::MOH).as_deref(), Some(""));
    }

    #[test]
    fn test_report_serializes_failed_block_as_error() {
        let report = compute_cost_summary(&inputs(&["Process Name", "Rate"]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["process"]["code"],
            serde_json::json!("pcbcost::schema::missing_column")
        );
        assert!(json["nre"]["total_cost"].is_number());
    }
}
