use crate::domains::employee::types::{Employee, Rating, RatingPatch};
use uuid::Uuid;

/// Merge a rating patch into the employee's rating list.
///
/// Finds the entry for `kpi_id` or appends a new one; there is never more than
/// one entry per KPI. Only fields present in the patch are written, so a
/// manager patch leaves self fields alone and vice versa. The weightage
/// snapshot is taken once, when the entry is first created.
///
/// Authorization is the caller's job. Persisting the result is too.
pub fn upsert_rating(mut employee: Employee, kpi_id: Uuid, patch: RatingPatch) -> Employee {
    match employee.ratings.iter_mut().find(|r| r.kpi_id == kpi_id) {
        Some(existing) => apply_patch(existing, patch),
        None => {
            let mut created = Rating {
                kpi_id,
                ..Default::default()
            };
            apply_patch(&mut created, patch);
            employee.ratings.push(created);
        }
    }
    employee
}

fn apply_patch(rating: &mut Rating, patch: RatingPatch) {
    if let Some(value) = patch.self_rating {
        rating.self_rating = Some(value);
    }
    if let Some(comments) = patch.comments {
        rating.comments = Some(comments);
    }
    if let Some(value) = patch.manager_rating {
        rating.manager_rating = Some(value);
    }
    if let Some(remarks) = patch.manager_remarks {
        rating.manager_remarks = Some(remarks);
    }
    if rating.weightage.is_none() {
        rating.weightage = patch.weightage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use chrono::Utc;

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Imran Sheikh".into(),
            email: "imran@example.com".into(),
            role: UserRole::ExecutiveAssociate,
            manager_id: Some(Uuid::new_v4()),
            ratings: Vec::new(),
            overall_performance_rating: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn manager_upsert_creates_single_entry_without_self_fields() {
        let kpi = Uuid::new_v4();
        let updated = upsert_rating(employee(), kpi, RatingPatch::manager_review(8.0, Some("good".into())));

        assert_eq!(updated.ratings.len(), 1);
        let rating = &updated.ratings[0];
        assert_eq!(rating.kpi_id, kpi);
        assert_eq!(rating.manager_rating, Some(8.0));
        assert_eq!(rating.manager_remarks.as_deref(), Some("good"));
        assert_eq!(rating.self_rating, None);
        assert_eq!(rating.comments, None);
    }

    #[test]
    fn self_upsert_after_manager_mutates_same_entry() {
        let kpi = Uuid::new_v4();
        let after_manager = upsert_rating(employee(), kpi, RatingPatch::manager_review(8.0, None));
        let after_self = upsert_rating(after_manager, kpi, RatingPatch::self_review(9.0, Some("shipped early".into())));

        assert_eq!(after_self.ratings.len(), 1);
        let rating = &after_self.ratings[0];
        assert_eq!(rating.manager_rating, Some(8.0));
        assert_eq!(rating.self_rating, Some(9.0));
        assert_eq!(rating.comments.as_deref(), Some("shipped early"));
    }

    #[test]
    fn manager_update_never_clobbers_self_fields() {
        let kpi = Uuid::new_v4();
        let e = upsert_rating(employee(), kpi, RatingPatch::self_review(6.0, Some("mine".into())));
        let e = upsert_rating(e, kpi, RatingPatch::manager_review(4.0, Some("theirs".into())));
        let e = upsert_rating(e, kpi, RatingPatch::manager_review(5.0, None));

        let rating = e.rating_for(kpi).unwrap();
        assert_eq!(rating.self_rating, Some(6.0));
        assert_eq!(rating.comments.as_deref(), Some("mine"));
        assert_eq!(rating.manager_rating, Some(5.0));
        assert_eq!(rating.manager_remarks.as_deref(), Some("theirs"));
    }

    #[test]
    fn separate_kpis_get_separate_entries() {
        let e = upsert_rating(employee(), Uuid::new_v4(), RatingPatch::self_review(3.0, None));
        let e = upsert_rating(e, Uuid::new_v4(), RatingPatch::self_review(4.0, None));
        assert_eq!(e.ratings.len(), 2);
    }

    #[test]
    fn weightage_snapshot_is_taken_once() {
        let kpi = Uuid::new_v4();
        let e = upsert_rating(employee(), kpi, RatingPatch::self_review(3.0, None).with_weightage(30.0));
        let e = upsert_rating(e, kpi, RatingPatch::manager_review(4.0, None).with_weightage(45.0));
        assert_eq!(e.rating_for(kpi).unwrap().weightage, Some(30.0));
    }
}
