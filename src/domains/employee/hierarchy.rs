use crate::domains::employee::types::{Employee, HierarchyNode, RoleCounts};
use crate::types::ReportingScope;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Mean manager rating across all of an employee's rating entries.
///
/// Entries without a manager rating contribute 0 but still count in the
/// divisor. No entries gives 0.
pub fn overall_rating(employee: &Employee) -> f64 {
    let sum: f64 = employee
        .ratings
        .iter()
        .map(|r| r.manager_rating.unwrap_or(0.0))
        .sum();
    let divisor = employee.ratings.len().max(1) as f64;
    sum / divisor
}

/// Group-by-role count over whichever slice of the population the scope admits
pub fn role_counts<'a, I>(population: I, scope: ReportingScope) -> RoleCounts
where
    I: IntoIterator<Item = &'a HierarchyNode>,
{
    let mut counts = RoleCounts::default();
    if scope == ReportingScope::NoReports {
        return counts;
    }
    for node in population.into_iter().filter(|n| in_scope(n, scope)) {
        *counts.role_counts.entry(node.role).or_insert(0) += 1;
        counts.total_users += 1;
    }
    counts
}

fn in_scope(node: &HierarchyNode, scope: ReportingScope) -> bool {
    match scope {
        ReportingScope::Organization => true,
        ReportingScope::DirectReports(manager_id) => node.manager_id == Some(manager_id),
        ReportingScope::NoReports => false,
    }
}

/// Reporting lines indexed by employee id, one parent link per employee, in
/// the order nodes were supplied.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    index: HashMap<Uuid, usize>,
}

impl Hierarchy {
    pub fn from_nodes<I: IntoIterator<Item = HierarchyNode>>(nodes: I) -> Self {
        let mut hierarchy = Self::default();
        for node in nodes {
            hierarchy.index.insert(node.id, hierarchy.nodes.len());
            hierarchy.nodes.push(node);
        }
        hierarchy
    }

    fn manager_of(&self, id: Uuid) -> Option<Uuid> {
        self.index.get(&id).and_then(|&i| self.nodes[i].manager_id)
    }

    /// Managers above `id`, nearest first. Stops if stored data already loops.
    fn chain_of_command(&self, id: Uuid) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.manager_of(id);
        while let Some(manager_id) = current {
            if !seen.insert(manager_id) {
                break;
            }
            chain.push(manager_id);
            current = self.manager_of(manager_id);
        }
        chain
    }

    /// True when making `new_manager_id` the manager of `employee_id` would
    /// close a loop, i.e. the employee is the new manager or sits above them.
    pub fn would_create_cycle(&self, employee_id: Uuid, new_manager_id: Uuid) -> bool {
        employee_id == new_manager_id || self.chain_of_command(new_manager_id).contains(&employee_id)
    }

    /// Employees visible under a reporting scope, in supplied order
    pub fn members(&self, scope: ReportingScope) -> Vec<&HierarchyNode> {
        self.nodes.iter().filter(|n| in_scope(n, scope)).collect()
    }

    pub fn role_counts(&self, scope: ReportingScope) -> RoleCounts {
        role_counts(self.nodes.iter(), scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::employee::types::Rating;
    use crate::types::UserRole;
    use chrono::Utc;

    fn node(id: Uuid, manager_id: Option<Uuid>, role: UserRole) -> HierarchyNode {
        HierarchyNode { id, manager_id, role }
    }

    fn employee_with_manager_ratings(ratings: &[Option<f64>]) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Meera Pillai".into(),
            email: "meera@example.com".into(),
            role: UserRole::ExecutiveAssociate,
            manager_id: None,
            ratings: ratings
                .iter()
                .map(|r| Rating {
                    kpi_id: Uuid::new_v4(),
                    manager_rating: *r,
                    ..Default::default()
                })
                .collect(),
            overall_performance_rating: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn overall_rating_counts_missing_manager_ratings_in_divisor() {
        let e = employee_with_manager_ratings(&[Some(8.0), Some(6.0), None]);
        assert!((overall_rating(&e) - 14.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn overall_rating_of_empty_list_is_zero() {
        let e = employee_with_manager_ratings(&[]);
        assert_eq!(overall_rating(&e), 0.0);
        let e = employee_with_manager_ratings(&[None, None]);
        assert_eq!(overall_rating(&e), 0.0);
    }

    #[test]
    fn organisation_scope_counts_everyone() {
        let population = vec![
            node(Uuid::new_v4(), None, UserRole::Manager),
            node(Uuid::new_v4(), None, UserRole::Manager),
            node(Uuid::new_v4(), None, UserRole::ExecutiveAssociate),
        ];
        let counts = role_counts(&population, ReportingScope::Organization);
        assert_eq!(counts.total_users, 3);
        assert_eq!(counts.role_counts.get(&UserRole::Manager), Some(&2));
        assert_eq!(counts.role_counts.get(&UserRole::ExecutiveAssociate), Some(&1));
        assert_eq!(counts.role_counts.len(), 2);
    }

    #[test]
    fn direct_report_scope_excludes_everyone_else() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let population = vec![
            node(Uuid::new_v4(), Some(me), UserRole::ExecutiveAssociate),
            node(Uuid::new_v4(), Some(me), UserRole::Manager),
            node(Uuid::new_v4(), Some(other), UserRole::ExecutiveAssociate),
            node(me, None, UserRole::Manager),
        ];
        let counts = role_counts(&population, ReportingScope::DirectReports(me));
        assert_eq!(counts.total_users, 2);
        assert_eq!(counts.role_counts.get(&UserRole::ExecutiveAssociate), Some(&1));
        assert_eq!(counts.role_counts.get(&UserRole::Manager), Some(&1));
    }

    #[test]
    fn no_reports_scope_is_empty() {
        let population = vec![node(Uuid::new_v4(), None, UserRole::Manager)];
        assert_eq!(role_counts(&population, ReportingScope::NoReports), RoleCounts::default());
    }

    #[test]
    fn cycle_guard_and_chain_of_command() {
        let ceo = Uuid::new_v4();
        let head = Uuid::new_v4();
        let manager = Uuid::new_v4();
        let associate = Uuid::new_v4();
        let h = Hierarchy::from_nodes(vec![
            node(ceo, None, UserRole::Ceo),
            node(head, Some(ceo), UserRole::ProgramHead),
            node(manager, Some(head), UserRole::Manager),
            node(associate, Some(manager), UserRole::ExecutiveAssociate),
        ]);

        assert_eq!(h.chain_of_command(associate), vec![manager, head, ceo]);

        assert!(h.would_create_cycle(head, associate));
        assert!(h.would_create_cycle(manager, manager));
        assert!(!h.would_create_cycle(associate, head));
    }

    #[test]
    fn chain_walk_terminates_on_corrupt_loop() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let h = Hierarchy::from_nodes(vec![
            node(a, Some(b), UserRole::Manager),
            node(b, Some(a), UserRole::Manager),
        ]);
        assert_eq!(h.chain_of_command(a), vec![b]);
    }
}
