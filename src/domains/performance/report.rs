//! Report projection and per-employee rollups.
//!
//! The database join and the in-memory `inner_join` both end in
//! `project`, so a row looks the same whichever path produced it.

use crate::domains::employee::types::EmployeeSummary;
use crate::domains::kpi::types::Kpi;
use crate::domains::performance::scoring::{compute_score, submitted_value};
use crate::domains::performance::types::{EmployeeScorecard, PerformanceRecord, PerformanceReportRow};
use crate::types::UserRole;
use std::collections::HashMap;
use uuid::Uuid;

/// Weighted score of a record, using the manager's achievement or 0
pub fn score_record(record: &PerformanceRecord) -> f64 {
    let achievement = submitted_value(Some(&record.manager_achievement)).unwrap_or(0.0);
    compute_score(achievement, record.goal, record.weightage)
}

pub fn project(
    record: &PerformanceRecord,
    kpi_name: &str,
    employee_name: &str,
    employee_role: UserRole,
) -> PerformanceReportRow {
    PerformanceReportRow {
        id: record.id,
        remarks: record.remarks.clone(),
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
        employee_id: record.employee_id,
        employee_name: employee_name.to_string(),
        employee_role,
        kpi_id: record.kpi_id,
        kpi_name: kpi_name.to_string(),
        weightage: record.weightage,
        goal: record.goal,
        manager_achievement: submitted_value(Some(&record.manager_achievement)),
        emp_achievement: submitted_value(Some(&record.emp_achievement)),
        average: score_record(record),
    }
}

pub fn project_row(record: &PerformanceRecord, kpi: &Kpi, employee: &EmployeeSummary) -> PerformanceReportRow {
    project(record, &kpi.name, &employee.name, employee.role)
}

/// Join records to their KPI and employee, dropping any record whose
/// references do not both resolve. Record order is preserved.
pub fn inner_join(
    records: &[PerformanceRecord],
    kpis: &[Kpi],
    employees: &[EmployeeSummary],
) -> Vec<PerformanceReportRow> {
    let kpis: HashMap<Uuid, &Kpi> = kpis.iter().map(|k| (k.id, k)).collect();
    let employees: HashMap<Uuid, &EmployeeSummary> = employees.iter().map(|e| (e.id, e)).collect();

    records
        .iter()
        .filter_map(|record| {
            let kpi = kpis.get(&record.kpi_id)?;
            let employee = employees.get(&record.employee_id)?;
            Some(project_row(record, kpi, employee))
        })
        .collect()
}

/// Sum of `employee`'s row scores alongside their overall rating
pub fn build_scorecard(
    employee: &EmployeeSummary,
    rows: &[PerformanceReportRow],
    overall_rating: f64,
) -> EmployeeScorecard {
    let own = rows.iter().filter(|r| r.employee_id == employee.id);
    let (kpi_count, total_score) = own.fold((0u64, 0.0), |(n, sum), r| (n + 1, sum + r.average));

    EmployeeScorecard {
        employee_id: employee.id,
        name: employee.name.clone(),
        role: employee.role,
        kpi_count,
        total_score,
        overall_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn kpi(name: &str) -> Kpi {
        Kpi {
            id: Uuid::new_v4(),
            name: name.into(),
            weightage: 50.0,
            goal: 100.0,
            achievement: None,
            added_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn person(name: &str) -> EmployeeSummary {
        EmployeeSummary {
            id: Uuid::new_v4(),
            name: name.into(),
            role: UserRole::ExecutiveAssociate,
        }
    }

    fn record(kpi_id: Uuid, employee_id: Uuid, weightage: f64, goal: f64, manager: &str) -> PerformanceRecord {
        PerformanceRecord {
            id: Uuid::new_v4(),
            kpi_id,
            employee_id,
            added_by: Uuid::new_v4(),
            weightage,
            goal,
            manager_achievement: manager.into(),
            emp_achievement: String::new(),
            remarks: "noted".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_score_uses_snapshot_and_manager_achievement() {
        let k = kpi("Reach");
        let e = person("Tara");
        let row = project_row(&record(k.id, e.id, 50.0, 100.0, "80"), &k, &e);
        assert!((row.average - 4.0).abs() < 1e-9);
        assert_eq!(row.manager_achievement, Some(80.0));
        assert_eq!(row.emp_achievement, None);
        assert_eq!(row.kpi_name, "Reach");
    }

    #[test]
    fn missing_manager_achievement_scores_zero() {
        let k = kpi("Reach");
        let e = person("Tara");
        let pending = record(k.id, e.id, 50.0, 100.0, "");
        assert_eq!(score_record(&pending), 0.0);
        let garbled = record(k.id, e.id, 50.0, 100.0, "n/a");
        assert_eq!(project_row(&garbled, &k, &e).average, 0.0);
    }

    #[test]
    fn unresolved_references_are_dropped() {
        let k = kpi("Reach");
        let e = person("Tara");
        let records = vec![
            record(k.id, e.id, 50.0, 100.0, "50"),
            record(Uuid::new_v4(), e.id, 50.0, 100.0, "50"),
            record(k.id, Uuid::new_v4(), 50.0, 100.0, "50"),
        ];
        let rows = inner_join(&records, &[k], &[e]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, records[0].id);
    }

    #[test]
    fn scorecard_sums_only_own_rows() {
        let k = kpi("Reach");
        let tara = person("Tara");
        let dev = person("Dev");
        let records = vec![
            record(k.id, tara.id, 50.0, 100.0, "80"),
            record(k.id, tara.id, 40.0, 50.0, "25"),
            record(k.id, dev.id, 50.0, 50.0, "50"),
        ];
        let rows = inner_join(&records, &[k], &[tara.clone(), dev]);

        let card = build_scorecard(&tara, &rows, 6.5);
        assert_eq!(card.kpi_count, 2);
        assert!((card.total_score - 6.0).abs() < 1e-9);
        assert_eq!(card.overall_rating, 6.5);
    }
}
