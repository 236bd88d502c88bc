//! Spreadsheet layout for the pipeline KPIs

use async_trait::async_trait;
use serde::Serialize;

use super::kpis::{round2, PipelineKpis};
use super::PipelineError;

/// A scalar written to one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Number(f64),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Destination for KPI cell writes
#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// Prepare clients and resolve the target sheet before a run
    async fn initialize(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Write a single cell of the KPI worksheet, e.g. `"B2"`
    async fn update_cell(&self, cell: &str, value: CellValue) -> Result<(), PipelineError>;
}

/// KPI fields that are written to the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiField {
    TotalUsers,
    TotalSessions,
    AvgConversionRate,
    AvgCpa,
    TotalSpend,
    Roas,
}

impl KpiField {
    /// Cell value for this field; floats are rounded to two decimals
    pub fn value(self, kpis: &PipelineKpis) -> CellValue {
        match self {
            KpiField::TotalUsers => CellValue::Integer(kpis.total_users),
            KpiField::TotalSessions => CellValue::Integer(kpis.total_sessions),
            KpiField::AvgConversionRate => CellValue::Number(round2(kpis.avg_conversion_rate)),
            KpiField::AvgCpa => CellValue::Number(round2(kpis.avg_cpa)),
            KpiField::TotalSpend => CellValue::Number(round2(kpis.total_spend)),
            KpiField::Roas => CellValue::Number(round2(kpis.roas)),
        }
    }
}

/// Fixed cell for each KPI, in write order
pub const SHEET_LAYOUT: [(&str, KpiField); 6] = [
    ("B2", KpiField::TotalUsers),
    ("B3", KpiField::TotalSessions),
    ("B4", KpiField::AvgConversionRate),
    ("B5", KpiField::AvgCpa),
    ("B6", KpiField::TotalSpend),
    ("B7", KpiField::Roas),
];

/// Cell writes for a KPI set, in layout order
pub fn sheet_updates(kpis: &PipelineKpis) -> Vec<(&'static str, CellValue)> {
    SHEET_LAYOUT
        .iter()
        .map(|(cell, field)| (*cell, field.value(kpis)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_updates_layout() {
        let kpis = PipelineKpis {
            total_users: 1200,
            total_sessions: 3400,
            avg_conversion_rate: 2.3456,
            avg_cpa: 41.111,
            total_spend: 9876.543,
            roas: 1.234,
        };

        let updates = sheet_updates(&kpis);
        assert_eq!(
            updates,
            vec![
                ("B2", CellValue::Integer(1200)),
                ("B3", CellValue::Integer(3400)),
                ("B4", CellValue::Number(2.35)),
                ("B5", CellValue::Number(41.11)),
                ("B6", CellValue::Number(9876.54)),
                ("B7", CellValue::Number(1.23)),
            ]
        );
    }

    #[test]
    fn test_cell_value_json() {
        assert_eq!(serde_json::to_string(&CellValue::Integer(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&CellValue::Number(1.5)).unwrap(), "1.5");
    }
}
